//! Pending claim/withdrawal requests and their backing investments.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;

/// A pending claim against a matured investment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    #[serde(default)]
    pub id: Option<i64>,
    pub owner_address: String,
    pub profit: String,
    pub amount: String,
    pub token_name: String,
    pub duration_weeks: u32,
    pub investment_id: i64,
    pub unlock_date: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

pub async fn list(client: &ApiClient) -> Result<Vec<WithdrawalRequest>, ApiError> {
    client.get("/withdrawals").await
}

pub async fn delete(client: &ApiClient, withdrawal_id: i64) -> Result<(), ApiError> {
    client.delete(&format!("/withdrawals/{withdrawal_id}")).await
}

/// Removes the investment backing a completed claim.
pub async fn delete_investment(client: &ApiClient, investment_id: i64) -> Result<(), ApiError> {
    client.delete(&format!("/investments/{investment_id}")).await
}
