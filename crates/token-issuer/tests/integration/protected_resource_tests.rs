//! E2E tests for strict validation on a protected resource
//! (`POST /api/v1/auth/test`).

use issuer_test_utils::{TestIssuerServer, TestTokenBuilder, TEST_AUDIENCE, TEST_ISSUER};
use reqwest::StatusCode;
use serde_json::json;
use token_issuer::services::credential_store::mock::MockCredentialStore;
use token_issuer::services::credential_store::UserAttributes;

async fn call_protected(
    server: &TestIssuerServer,
    authorization: Option<&str>,
) -> Result<reqwest::Response, anyhow::Error> {
    let mut request = reqwest::Client::new().post(format!("{}/api/v1/auth/test", server.url()));
    if let Some(value) = authorization {
        request = request.header("Authorization", value);
    }
    Ok(request.send().await?)
}

/// A freshly issued login token unlocks the resource and every claim echoes back.
#[tokio::test]
async fn test_protected_resource_valid_token_returns_claims() -> Result<(), anyhow::Error> {
    // Arrange
    let store = MockCredentialStore::new().with_user(
        "alice",
        "correct-password",
        UserAttributes {
            organization_id: 7,
            is_organizer: true,
        },
    );
    let server = TestIssuerServer::spawn(store).await?;
    let token: String = reqwest::Client::new()
        .post(format!("{}/api/v1/auth", server.url()))
        .json(&json!({"username": "alice", "password": "correct-password"}))
        .send()
        .await?
        .json()
        .await?;

    // Act
    let response = call_protected(&server, Some(&format!("Bearer {}", token))).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let claims: Vec<serde_json::Value> = response.json().await?;
    let value_of = |claim: &str| {
        claims
            .iter()
            .find(|c| c["type"] == claim)
            .and_then(|c| c["value"].as_str())
            .map(str::to_string)
    };
    assert_eq!(value_of("sub").as_deref(), Some("alice"));
    assert_eq!(value_of("IdOng").as_deref(), Some("7"));
    assert_eq!(value_of("Organizator").as_deref(), Some("True"));
    assert_eq!(value_of("iss").as_deref(), Some(TEST_ISSUER));
    assert_eq!(value_of("aud").as_deref(), Some(TEST_AUDIENCE));
    assert!(value_of("nbf").is_some());
    assert!(value_of("exp").is_some());

    Ok(())
}

/// An expired token is rejected here even though renewal would accept it.
#[tokio::test]
async fn test_protected_resource_expired_token_unauthenticated() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;
    let now = chrono::Utc::now().timestamp();
    let expired = server.issue_token_at("alice", 7, true, now - 7200)?;

    let response = call_protected(&server, Some(&format!("Bearer {}", expired))).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

/// A token that is not yet valid is rejected.
#[tokio::test]
async fn test_protected_resource_future_token_unauthenticated() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;
    let later = chrono::Utc::now().timestamp() + 600;

    let token = TestTokenBuilder::new().issued_at(later).sign(1)?;

    let response = call_protected(&server, Some(&format!("Bearer {}", token))).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

/// No credentials, no access.
#[tokio::test]
async fn test_protected_resource_missing_header_unauthenticated() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;

    let response = call_protected(&server, None).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    Ok(())
}

/// A token whose `exp` has just passed is rejected even though `nbf` is current.
#[tokio::test]
async fn test_protected_resource_lapsed_token_unauthenticated() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;
    let now = chrono::Utc::now().timestamp();

    let token = TestTokenBuilder::new()
        .issued_at(now - 600)
        .not_before(now - 600)
        .expires_at(now - 1)
        .sign(1)?;

    let response = call_protected(&server, Some(&format!("Bearer {}", token))).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

/// Correctly signed tokens meant for another audience do not unlock the resource.
#[tokio::test]
async fn test_protected_resource_wrong_audience_unauthenticated() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;

    let token = TestTokenBuilder::new().with_audience("billing").sign(1)?;

    let response = call_protected(&server, Some(&format!("Bearer {}", token))).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
