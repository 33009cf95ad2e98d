//! On-chain balance lookups.

use serde::Deserialize;

use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    pub balance: String,
}

/// Looks up the balance of `wallet_address` for the token at
/// `token_address`.
pub async fn get(
    client: &ApiClient,
    wallet_address: &str,
    token_address: &str,
) -> Result<BalanceResponse, ApiError> {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("walletAddress", wallet_address)
        .append_pair("tokenAddress", token_address)
        .finish();
    client.get(&format!("/balance?{query}")).await
}
