//! Cached read and mutation operations over the backend resources.
//!
//! Every listing goes through the query cache under a fixed resource key;
//! every mutation invalidates the keys it affects, except the balance
//! lookup, which writes straight through into the cached approvals list.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::{QueryCache, QueryOptions};
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::resources::approvals::{self, Approval};
use crate::resources::auth;
use crate::resources::balance;
use crate::resources::contracts::{self, Contract, NewContract};
use crate::resources::transfers::{self, TransferRequest};
use crate::resources::withdrawals::{self, WithdrawalRequest};
use crate::session::User;
use crate::tokens;

/// Cache key for the approvals listing.
pub const APPROVALS_KEY: &str = "approvals";
/// Cache key for the pending claim/withdrawal listing.
pub const WITHDRAWALS_KEY: &str = "withdrawalRequests";
/// Cache key for the contracts listing.
pub const CONTRACTS_KEY: &str = "contracts";

/// High-level console operations: client + cache + session, wired together.
pub struct Queries {
    client: Arc<ApiClient>,
    cache: QueryCache,
    stale_time: Duration,
    forwarder_address: Option<String>,
}

impl Queries {
    pub fn new(client: Arc<ApiClient>, config: &Config) -> Self {
        Self {
            client,
            cache: QueryCache::new(),
            stale_time: config.stale_time(),
            forwarder_address: config.token_forwarder_address.clone(),
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Authenticates and installs the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let response = auth::login(&self.client, email, password).await?;
        self.client.session().login(
            response.user.clone(),
            &response.access_token,
            &response.refresh_token,
        );
        Ok(response.user)
    }

    pub fn logout(&self) {
        self.client.session().logout();
    }

    /// Cached approvals listing. Deferred until a session exists.
    pub async fn approvals(&self) -> Result<Vec<Approval>, ApiError> {
        let enabled = self.client.session().is_authenticated();
        let options = QueryOptions {
            enabled,
            stale_time: self.stale_time,
        };
        let client = Arc::clone(&self.client);
        let value = self
            .cache
            .query(APPROVALS_KEY, options, move || async move {
                encode_rows(approvals::list(&client).await?)
            })
            .await?;
        decode_rows(value)
    }

    /// Cached pending-claims listing.
    pub async fn withdrawal_requests(&self) -> Result<Vec<WithdrawalRequest>, ApiError> {
        let options = QueryOptions::with_stale_time(self.stale_time);
        let client = Arc::clone(&self.client);
        let value = self
            .cache
            .query(WITHDRAWALS_KEY, options, move || async move {
                encode_rows(withdrawals::list(&client).await?)
            })
            .await?;
        decode_rows(value)
    }

    /// Cached contracts listing.
    pub async fn contracts(&self) -> Result<Vec<Contract>, ApiError> {
        let options = QueryOptions::with_stale_time(self.stale_time);
        let client = Arc::clone(&self.client);
        let value = self
            .cache
            .query(CONTRACTS_KEY, options, move || async move {
                encode_rows(contracts::list(&client).await?)
            })
            .await?;
        decode_rows(value)
    }

    pub async fn delete_approval(&self, approval_id: i64) -> Result<(), ApiError> {
        self.cache
            .mutate(&[APPROVALS_KEY], || async {
                approvals::delete(&self.client, approval_id).await
            })
            .await
    }

    /// Completes a claim: removes the withdrawal request, then the
    /// investment backing it. The second delete only runs once the first
    /// has succeeded.
    pub async fn complete_claim(&self, claim_id: i64, investment_id: i64) -> Result<(), ApiError> {
        self.cache
            .mutate(&[WITHDRAWALS_KEY], || async {
                withdrawals::delete(&self.client, claim_id).await?;
                withdrawals::delete_investment(&self.client, investment_id).await
            })
            .await
    }

    pub async fn create_contract(&self, contract: &NewContract) -> Result<Contract, ApiError> {
        self.cache
            .mutate(&[CONTRACTS_KEY], || async {
                contracts::create(&self.client, contract).await
            })
            .await
    }

    pub async fn destroy_contract(&self, contract_id: i64) -> Result<(), ApiError> {
        self.cache
            .mutate(&[CONTRACTS_KEY], || async {
                contracts::delete(&self.client, contract_id).await
            })
            .await
    }

    /// Orders a token transfer out of an approved wallet. Recipient and
    /// amount are validated before any request goes out.
    pub async fn transfer(
        &self,
        approval: &Approval,
        recipient_address: &str,
        amount: &str,
    ) -> Result<Value, ApiError> {
        let recipient_address = recipient_address.trim();
        if recipient_address.is_empty() {
            return Err(ApiError::validation("recipient address is required"));
        }
        let amount = amount.trim();
        if amount.is_empty() {
            return Err(ApiError::validation("transfer amount is required"));
        }
        let token_address = known_token_address(&approval.token_symbol)?;

        let request = TransferRequest {
            token_address: token_address.to_string(),
            sender_address: approval.owner_address.clone(),
            recipient_address: recipient_address.to_string(),
            amount: amount.to_string(),
            token_forwarder_contract_address: self.forwarder_address.clone().unwrap_or_default(),
            user_id: approval.user_id,
        };

        self.cache
            .mutate(&[APPROVALS_KEY], || async {
                transfers::transfer(&self.client, &request).await
            })
            .await
    }

    /// Fetches the owner's balance for an approval's token and merges it
    /// into the cached approvals list without a re-fetch.
    pub async fn load_balance(&self, approval: &Approval) -> Result<String, ApiError> {
        let token_address = known_token_address(&approval.token_symbol)?;
        let response =
            balance::get(&self.client, &approval.owner_address, token_address).await?;

        let id = approval.id;
        let fetched = response.balance.clone();
        self.cache
            .write_cache(APPROVALS_KEY, move |value| merge_balance(value, id, &fetched));
        Ok(response.balance)
    }
}

fn known_token_address(symbol: &str) -> Result<&'static str, ApiError> {
    tokens::token_address(symbol)
        .ok_or_else(|| ApiError::validation(format!("Unknown token symbol: {symbol}")))
}

fn encode_rows<T: serde::Serialize>(rows: Vec<T>) -> Result<Value, ApiError> {
    serde_json::to_value(rows).map_err(|e| ApiError::parse(format!("Failed to encode rows: {e}")))
}

fn decode_rows<T: DeserializeOwned>(value: Option<Value>) -> Result<Vec<T>, ApiError> {
    match value {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| ApiError::parse(format!("Failed to decode cached rows: {e}"))),
        // A disabled query with nothing cached: no session yet.
        None => Err(ApiError::auth_expired("not logged in")),
    }
}

/// Sets `balance` on the row whose id matches, leaving every other row
/// untouched.
fn merge_balance(value: Value, id: i64, balance: &str) -> Value {
    let Value::Array(rows) = value else {
        return value;
    };
    Value::Array(
        rows.into_iter()
            .map(|mut row| {
                if row.get("id").and_then(Value::as_i64) == Some(id)
                    && let Value::Object(fields) = &mut row
                {
                    fields.insert("balance".to_string(), Value::String(balance.to_string()));
                }
                row
            })
            .collect(),
    )
}
