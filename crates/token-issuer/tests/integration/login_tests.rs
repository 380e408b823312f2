//! E2E tests for the login flow (`POST /api/v1/auth`).
//!
//! ## Test Naming
//!
//! Tests follow the convention: `test_<feature>_<scenario>_<expected_result>`

use issuer_test_utils::{TestIssuerServer, TokenAssertions, TEST_KEY_ID};
use reqwest::StatusCode;
use serde_json::json;
use token_issuer::services::credential_store::mock::MockCredentialStore;
use token_issuer::services::credential_store::UserAttributes;

fn store() -> MockCredentialStore {
    MockCredentialStore::new()
        .with_user(
            "alice",
            "correct-password",
            UserAttributes {
                organization_id: 7,
                is_organizer: true,
            },
        )
        .with_user("bob", "bobs-password", UserAttributes::default())
}

async fn login(
    server: &TestIssuerServer,
    body: serde_json::Value,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .post(format!("{}/api/v1/auth", server.url()))
        .json(&body)
        .send()
        .await?)
}

/// Valid credentials return the signed token as a JSON string.
#[tokio::test]
async fn test_login_happy_path_returns_token() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestIssuerServer::spawn(store()).await?;

    // Act
    let response = login(
        &server,
        json!({"username": "alice", "password": "correct-password"}),
    )
    .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let token: String = response.json().await?;
    token
        .assert_valid_jwt()
        .assert_signed_by(TEST_KEY_ID)
        .assert_for_subject("alice")
        .assert_organization(7)
        .assert_organizer(true)
        .assert_expires_in(3600);

    Ok(())
}

/// A user without organization still gets the claims, as "0" and "False".
#[tokio::test]
async fn test_login_default_attributes_are_present() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(store()).await?;

    let response = login(&server, json!({"username": "bob", "password": "bobs-password"})).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let token: String = response.json().await?;
    token.assert_organization(0).assert_organizer(false);

    Ok(())
}

/// Field names sent by existing clients are accepted.
#[tokio::test]
async fn test_login_accepts_legacy_field_casing() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(store()).await?;

    let response = login(
        &server,
        json!({"UserName": "alice", "Password": "correct-password"}),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

/// Unknown user and wrong password are indistinguishable to the caller.
#[tokio::test]
async fn test_login_invalid_credentials_identical_responses() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestIssuerServer::spawn(store()).await?;

    // Act
    let wrong_password = login(&server, json!({"username": "bob", "password": "wrongpass"})).await?;
    let wrong_status = wrong_password.status();
    let wrong_body = wrong_password.text().await?;

    let unknown_user = login(
        &server,
        json!({"username": "mallory", "password": "wrongpass"}),
    )
    .await?;
    let unknown_status = unknown_user.status();
    let unknown_body = unknown_user.text().await?;

    // Assert
    assert_eq!(wrong_status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_status, wrong_status);
    assert_eq!(unknown_body, wrong_body);

    let body: serde_json::Value = serde_json::from_str(&wrong_body)?;
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

    Ok(())
}

/// Empty fields are rejected without consulting the credential store.
#[tokio::test]
async fn test_login_empty_fields_rejected_without_store_call() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(store()).await?;

    for body in [
        json!({"username": "", "password": "correct-password"}),
        json!({"username": "alice", "password": ""}),
        json!({}),
    ] {
        let response = login(&server, body).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    }

    assert_eq!(server.store().call_count(), 0);

    Ok(())
}

/// A failing credential store surfaces as 503 without internal detail.
#[tokio::test]
async fn test_login_store_failure_returns_service_unavailable() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestIssuerServer::spawn(MockCredentialStore::failing()).await?;

    // Act
    let response = login(
        &server,
        json!({"username": "alice", "password": "correct-password"}),
    )
    .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response.text().await?;
    assert!(
        !body.contains("Mock"),
        "Store error text must not leak: {}",
        body
    );
    assert_eq!(server.store().call_count(), 1, "Store failures are not retried");

    Ok(())
}

/// Two logins by the same user yield distinct token ids.
#[tokio::test]
async fn test_login_repeated_tokens_have_distinct_ids() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(store()).await?;
    let body = json!({"username": "alice", "password": "correct-password"});

    let first: String = login(&server, body.clone()).await?.json().await?;
    let second: String = login(&server, body).await?.json().await?;

    assert_ne!(
        issuer_test_utils::decode_payload(&first).jti,
        issuer_test_utils::decode_payload(&second).jti
    );

    Ok(())
}
