//! Custodial contract records (address + pool + private key).

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;

/// Payload for registering a contract. The private key is held by the
/// backend custodian; it is write-only from this side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub contract_address: String,
    pub pool_address: String,
    pub private_key: String,
    pub created_at: String,
    pub user_id: Option<i64>,
}

/// A stored contract record. The backend never echoes the private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: i64,
    pub contract_address: String,
    pub pool_address: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

pub async fn list(client: &ApiClient) -> Result<Vec<Contract>, ApiError> {
    client.get("/contracts").await
}

pub async fn create(client: &ApiClient, contract: &NewContract) -> Result<Contract, ApiError> {
    client.post("/contracts", contract).await
}

pub async fn delete(client: &ApiClient, contract_id: i64) -> Result<(), ApiError> {
    client.delete(&format!("/contracts/{contract_id}")).await
}
