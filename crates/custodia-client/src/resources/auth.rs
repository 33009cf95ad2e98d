//! Login and token-renewal wire types.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::session::User;

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Renewed credential pair from `/auth/token/refresh`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Authenticates the operator. The caller is expected to feed the response
/// into the session store.
pub async fn login(
    client: &ApiClient,
    email: &str,
    password: &str,
) -> Result<LoginResponse, ApiError> {
    client
        .post("/auth/login", &LoginRequest { email, password })
        .await
}
