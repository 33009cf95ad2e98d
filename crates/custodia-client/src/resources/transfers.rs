//! Token transfer requests.

use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;

/// Transfer order handed to the backend, which signs and broadcasts it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub token_address: String,
    pub sender_address: String,
    pub recipient_address: String,
    pub amount: String,
    pub token_forwarder_contract_address: String,
    pub user_id: Option<i64>,
}

/// Submits a transfer. The backend response shape varies by token, so the
/// raw JSON is handed back for display.
pub async fn transfer(client: &ApiClient, request: &TransferRequest) -> Result<Value, ApiError> {
    client.post("/transfers/transfer", request).await
}
