//! Token-approval records.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;

/// One on-chain approval observed by the backend. `value` and `balance` are
/// raw integer amount strings; scaling them is a display concern
/// (see [`crate::tokens`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub id: i64,
    pub owner_address: String,
    pub spender_address: String,
    pub token_symbol: String,
    pub value: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Filled in by a balance lookup write-through, never by the listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
}

pub async fn list(client: &ApiClient) -> Result<Vec<Approval>, ApiError> {
    client.get("/approvals").await
}

pub async fn delete(client: &ApiClient, approval_id: i64) -> Result<(), ApiError> {
    client.delete(&format!("/approvals/{approval_id}")).await
}
