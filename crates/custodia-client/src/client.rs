//! Authenticated API client.
//!
//! Applies a uniform authentication and recovery policy to every request:
//! the bearer header is read from the session at send time, an unauthorized
//! response is answered with exactly one silent credential renewal and one
//! retry, and a forbidden response tears the session down.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::ApiError;
use crate::resources::auth::TokenPair;
use crate::session::SessionStore;

/// A pending outbound call. The `retried` flag bounds the refresh policy to
/// one renewal and one retry per original request.
struct RequestEnvelope {
    method: Method,
    path: String,
    body: Option<Value>,
    retried: bool,
}

impl RequestEnvelope {
    fn new(method: Method, path: &str, body: Option<Value>) -> Self {
        Self {
            method,
            path: path.to_string(),
            body,
            retried: false,
        }
    }
}

/// API client bound to a base URL and a shared session.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    /// Single-slot gate so concurrent unauthorized responses share one
    /// renewal instead of each spending the refresh credential.
    refresh_gate: Mutex<()>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// GET `path` and decode the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self
            .execute(RequestEnvelope::new(Method::GET, path, None))
            .await?;
        Self::decode(value)
    }

    /// POST `body` to `path` and decode the JSON response.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::parse(format!("Failed to serialize request body: {e}")))?;
        let value = self
            .execute(RequestEnvelope::new(Method::POST, path, Some(body)))
            .await?;
        Self::decode(value)
    }

    /// DELETE `path`, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(RequestEnvelope::new(Method::DELETE, path, None))
            .await
            .map(|_| ())
    }

    /// Issues the request once, applying the unauthorized/forbidden policy.
    async fn execute(&self, mut envelope: RequestEnvelope) -> Result<Value, ApiError> {
        let sent_with = self.session.access_token();
        let response = self.perform(&envelope).await?;

        match response.status() {
            StatusCode::UNAUTHORIZED
                if !envelope.retried && self.session.refresh_token().is_some() =>
            {
                envelope.retried = true;
                let original = Self::status_error(response).await;
                tracing::debug!(path = %envelope.path, "unauthorized, renewing credentials");

                if let Err(refresh_err) = self.refresh_access(sent_with.as_deref()).await {
                    tracing::warn!(path = %envelope.path, "credential renewal failed, logging out: {refresh_err}");
                    self.session.logout();
                    return Err(auth_exhausted(original));
                }

                // The renewed token is picked up at send time.
                let retry = self.perform(&envelope).await?;
                match retry.status() {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        tracing::warn!(path = %envelope.path, "retried request rejected, logging out");
                        self.session.logout();
                        Err(auth_exhausted(Self::status_error(retry).await))
                    }
                    _ => Self::finish(retry).await,
                }
            }
            StatusCode::UNAUTHORIZED => {
                // Already retried, or no refresh credential to spend.
                tracing::warn!(path = %envelope.path, "unauthorized with no renewal available, logging out");
                self.session.logout();
                Err(auth_exhausted(Self::status_error(response).await))
            }
            StatusCode::FORBIDDEN => {
                // The credential is valid but insufficient or revoked, not
                // expired; renewal cannot help.
                tracing::warn!(path = %envelope.path, "forbidden, logging out");
                self.session.logout();
                Err(Self::status_error(response).await)
            }
            _ => Self::finish(response).await,
        }
    }

    /// Sends the envelope exactly once with the current access credential.
    async fn perform(&self, envelope: &RequestEnvelope) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, envelope.path);
        let mut request = self
            .http
            .request(envelope.method.clone(), &url)
            .header("content-type", "application/json");

        if let Some(token) = self.session.access_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &envelope.body {
            request = request.json(body);
        }

        request.send().await.map_err(|e| ApiError::transport(&e))
    }

    /// Renews the credential pair. The gate admits one renewal at a time; a
    /// waiter that finds the access token already changed from the one its
    /// request failed with skips its own renewal call.
    async fn refresh_access(&self, stale_access: Option<&str>) -> Result<(), ApiError> {
        let _slot = self.refresh_gate.lock().await;

        if self.session.access_token().as_deref() != stale_access {
            tracing::debug!("credentials already renewed by a concurrent request");
            return Ok(());
        }

        let refresh_token = self
            .session
            .refresh_token()
            .ok_or_else(|| ApiError::auth_expired("no refresh credential"))?;

        // Dedicated renewal call, deliberately unauthenticated.
        let url = format!("{}/auth/token/refresh", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|e| ApiError::transport(&e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let pair: TokenPair = response
            .json()
            .await
            .map_err(|e| ApiError::parse(format!("Failed to parse token response: {e}")))?;

        // A renewed pair is only usable while an identity is still held.
        let Some(user) = self.session.user() else {
            return Err(ApiError::auth_expired("no identity held for renewed credentials"));
        };
        self.session.login(user, &pair.access_token, &pair.refresh_token);
        tracing::debug!("access credential renewed");
        Ok(())
    }

    /// Consumes a non-policy response: non-2xx becomes an error carrying the
    /// backend message, an empty 2xx body becomes `null`.
    async fn finish(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let body = response.bytes().await.map_err(|e| ApiError::transport(&e))?;

        if !status.is_success() {
            return Err(ApiError::http_status(
                status.as_u16(),
                &String::from_utf8_lossy(&body),
            ));
        }
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::parse(format!("Failed to parse response body: {e}")))
    }

    async fn status_error(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ApiError::http_status(status, &body)
    }

    fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
        serde_json::from_value(value)
            .map_err(|e| ApiError::parse(format!("Failed to decode response: {e}")))
    }
}

/// Marks a propagated failure as authentication-exhausted while keeping the
/// original status message for display.
fn auth_exhausted(original: ApiError) -> ApiError {
    ApiError {
        kind: crate::error::ApiErrorKind::AuthExpired,
        message: original.message,
        details: original.details,
    }
}
