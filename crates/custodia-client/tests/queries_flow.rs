//! Integration tests for the cached query layer over a mock backend.

use std::sync::Arc;

use custodia_client::client::ApiClient;
use custodia_client::config::Config;
use custodia_client::error::ApiErrorKind;
use custodia_client::queries::Queries;
use custodia_client::session::{SessionStore, User};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_user() -> User {
    User {
        id: 1,
        wallet_address: "0xowner".to_string(),
        email: None,
    }
}

fn queries_for(server: &MockServer, dir: &TempDir, logged_in: bool) -> Queries {
    let store = Arc::new(SessionStore::new(dir.path().join("session.json")));
    if logged_in {
        store.login(test_user(), "access-1", "refresh-1");
    }
    let client = Arc::new(ApiClient::new(server.uri(), store));
    Queries::new(client, &Config::default())
}

fn approval_row(id: i64) -> Value {
    json!({
        "id": id,
        "ownerAddress": "0xowner",
        "spenderAddress": "0xspender",
        "tokenSymbol": "USDT",
        "value": "1000000",
        "blockNumber": 123,
        "transactionHash": "0xhash",
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    })
}

fn contract_row(id: i64) -> Value {
    json!({
        "id": id,
        "contractAddress": "0xcontract",
        "poolAddress": "0xpool",
        "userId": null,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    })
}

/// Test: login installs the session and persists it; listings then work.
#[tokio::test]
async fn test_login_installs_session() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let queries = queries_for(&server, &dir, false);

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "a@x.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": 1, "walletAddress": "0xowner"},
            "accessToken": "access-1",
            "refreshToken": "refresh-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/approvals"))
        .and(wiremock::matchers::header(
            "authorization",
            "Bearer access-1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([approval_row(7)])))
        .expect(1)
        .mount(&server)
        .await;

    let user = queries.login("a@x.com", "secret").await.unwrap();
    assert_eq!(user.wallet_address, "0xowner");
    assert!(dir.path().join("session.json").exists());

    let rows = queries.approvals().await.unwrap();
    assert_eq!(rows.len(), 1);
}

/// Test: the approvals listing is deferred until a session exists.
#[tokio::test]
async fn test_approvals_deferred_without_session() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let queries = queries_for(&server, &dir, false);

    // No mock mounted: a fetch attempt would fail loudly with a 404.
    let err = queries.approvals().await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::AuthExpired);
}

/// Test: deleting a contract invalidates the listing; the next read
/// re-fetches.
#[tokio::test]
async fn test_destroy_contract_invalidates_listing() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let queries = queries_for(&server, &dir, true);

    Mock::given(method("GET"))
        .and(path("/contracts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([contract_row(42)])))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/contracts/42"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    // Two reads, one fetch: the entry stays fresh.
    queries.contracts().await.unwrap();
    queries.contracts().await.unwrap();

    queries.destroy_contract(42).await.unwrap();

    // Invalidation forces the second fetch.
    queries.contracts().await.unwrap();
}

/// Test: a balance lookup merges into the cached approvals list without
/// re-fetching it.
#[tokio::test]
async fn test_balance_write_through() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let queries = queries_for(&server, &dir, true);

    Mock::given(method("GET"))
        .and(path("/approvals"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([approval_row(7), approval_row(8)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/balance"))
        .and(query_param("walletAddress", "0xowner"))
        .and(query_param(
            "tokenAddress",
            "0xfd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": "9000000"})))
        .expect(1)
        .mount(&server)
        .await;

    let rows = queries.approvals().await.unwrap();
    let balance = queries.load_balance(&rows[0]).await.unwrap();
    assert_eq!(balance, "9000000");

    // Served from cache (the listing mock expects exactly one call), with
    // the looked-up balance merged into the right row.
    let rows = queries.approvals().await.unwrap();
    assert_eq!(rows[0].balance.as_deref(), Some("9000000"));
    assert_eq!(rows[1].balance, None);
}

/// Test: completing a claim deletes the withdrawal first, then its
/// investment, and invalidates the claims listing.
#[tokio::test]
async fn test_complete_claim_sequences_deletes() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let queries = queries_for(&server, &dir, true);

    let claims = json!([{
        "ownerAddress": "0xowner",
        "id": 5,
        "profit": "100",
        "amount": "1000",
        "tokenName": "USDT",
        "durationWeeks": 4,
        "investmentId": 9,
        "unlockDate": "2024-06-01T00:00:00Z"
    }]);

    Mock::given(method("GET"))
        .and(path("/withdrawals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&claims))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/withdrawals/5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/investments/9"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let rows = queries.withdrawal_requests().await.unwrap();
    assert_eq!(rows[0].investment_id, 9);

    queries.complete_claim(5, 9).await.unwrap();

    // Invalidated: this read goes back to the backend.
    queries.withdrawal_requests().await.unwrap();
}

/// Test: a failed withdrawal delete stops the sequence before the
/// investment delete.
#[tokio::test]
async fn test_complete_claim_stops_on_first_failure() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let queries = queries_for(&server, &dir, true);

    Mock::given(method("DELETE"))
        .and(path("/withdrawals/5"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db down"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/investments/9"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = queries.complete_claim(5, 9).await.unwrap_err();
    assert_eq!(err.message, "HTTP 500: db down");
}

/// Test: transfer validation rejects a missing recipient before any
/// request is sent.
#[tokio::test]
async fn test_transfer_requires_recipient() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let queries = queries_for(&server, &dir, true);

    let approval = serde_json::from_value(approval_row(7)).unwrap();
    let err = queries.transfer(&approval, "  ", "5").await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Validation);
}

/// Test: a transfer posts the full order and invalidates approvals.
#[tokio::test]
async fn test_transfer_posts_order() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SessionStore::new(dir.path().join("session.json")));
    store.login(test_user(), "access-1", "refresh-1");
    let client = Arc::new(ApiClient::new(server.uri(), store));
    let config = Config {
        token_forwarder_address: Some("0xforwarder".to_string()),
        ..Config::default()
    };
    let queries = Queries::new(client, &config);

    Mock::given(method("POST"))
        .and(path("/transfers/transfer"))
        .and(body_json(json!({
            "tokenAddress": "0xfd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9",
            "senderAddress": "0xowner",
            "recipientAddress": "0xrecipient",
            "amount": "5",
            "tokenForwarderContractAddress": "0xforwarder",
            "userId": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"txHash": "0xdeadbeef"})))
        .expect(1)
        .mount(&server)
        .await;

    let approval = serde_json::from_value(approval_row(7)).unwrap();
    let response = queries.transfer(&approval, "0xrecipient", "5").await.unwrap();
    assert_eq!(response["txHash"], "0xdeadbeef");
}
