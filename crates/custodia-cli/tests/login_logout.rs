//! Integration tests for login/logout/status against a mock backend.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_logout_when_not_logged_in() {
    let temp = tempfile::tempdir().unwrap();

    cargo_bin_cmd!("custodia")
        .env("CUSTODIA_HOME", temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[test]
fn test_status_when_not_logged_in() {
    let temp = tempfile::tempdir().unwrap();

    cargo_bin_cmd!("custodia")
        .env("CUSTODIA_HOME", temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_stores_session_and_logout_removes_it() {
    let server = MockServer::start().await;
    let temp = tempfile::tempdir().unwrap();
    let session_path = temp.path().join("session.json");

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "a@x.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": 1, "walletAddress": "0xowner", "email": "a@x.com"},
            "accessToken": "access-token-1234567890",
            "refreshToken": "refresh-token-1234567890"
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("custodia")
        .env("CUSTODIA_HOME", temp.path())
        .env("CUSTODIA_API_URL", server.uri())
        .args(["login", "--email", "a@x.com", "--password", "secret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as a@x.com"));

    assert!(session_path.exists(), "session.json should exist");
    let contents = std::fs::read_to_string(&session_path).unwrap();
    assert!(contents.contains("access-token-1234567890"));
    assert!(contents.contains("refresh-token-1234567890"));

    // Status shows the restored session with a masked token.
    cargo_bin_cmd!("custodia")
        .env("CUSTODIA_HOME", temp.path())
        .env("CUSTODIA_API_URL", server.uri())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("0xowner"))
        .stdout(predicate::str::contains("access-t...7890"))
        .stdout(predicate::str::contains("access-token-1234567890").not());

    cargo_bin_cmd!("custodia")
        .env("CUSTODIA_HOME", temp.path())
        .env("CUSTODIA_API_URL", server.uri())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    assert!(!session_path.exists(), "session.json should be removed");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_failure_reports_backend_message() {
    let server = MockServer::start().await;
    let temp = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "bad credentials"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("custodia")
        .env("CUSTODIA_HOME", temp.path())
        .env("CUSTODIA_API_URL", server.uri())
        .args(["login", "--email", "a@x.com", "--password", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad credentials"));
}
