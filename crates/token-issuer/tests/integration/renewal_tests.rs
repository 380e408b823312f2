//! E2E tests for token renewal (`GET /api/v1/auth`).
//!
//! Renewal trusts the signature of a previously issued token even after it
//! has expired, and never consults the credential store.

use issuer_test_utils::{
    decode_payload, test_hmac_secret, TestIssuerServer, TestTokenBuilder, TokenAssertions,
};
use reqwest::{header::WWW_AUTHENTICATE, StatusCode};
use serde_json::json;
use token_issuer::services::credential_store::mock::MockCredentialStore;

async fn renew(
    server: &TestIssuerServer,
    authorization: Option<&str>,
) -> Result<reqwest::Response, anyhow::Error> {
    let mut request = reqwest::Client::new().get(format!("{}/api/v1/auth", server.url()));
    if let Some(value) = authorization {
        request = request.header("Authorization", value);
    }
    Ok(request.send().await?)
}

/// A two-hour-old (expired) token renews with fresh iat/jti and same identity.
#[tokio::test]
async fn test_renewal_of_expired_token_succeeds() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;
    let now = chrono::Utc::now().timestamp();
    let old_token = server.issue_token_at("alice", 7, true, now - 7200)?;
    let old_claims = decode_payload(&old_token);

    // Act
    let response = renew(&server, Some(&format!("Bearer {}", old_token))).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let new_token: String = response.json().await?;
    new_token
        .assert_valid_jwt()
        .assert_for_subject("alice")
        .assert_organization(7)
        .assert_organizer(true)
        .assert_expires_in(3600);

    let new_claims = decode_payload(&new_token);
    assert!(new_claims.iat >= now);
    assert_ne!(new_claims.jti, old_claims.jti);
    assert_eq!(server.store().call_count(), 0);

    Ok(())
}

/// The scheme is case-insensitive and optional.
#[tokio::test]
async fn test_renewal_header_forms_accepted() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;
    let token = server.issue_token_at("alice", 0, false, chrono::Utc::now().timestamp())?;

    for header in [
        format!("Bearer {}", token),
        format!("bearer {}", token),
        token.clone(),
    ] {
        let response = renew(&server, Some(&header)).await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    Ok(())
}

/// Missing or blank headers are 401 with a bearer challenge.
#[tokio::test]
async fn test_renewal_missing_header_unauthenticated() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;

    for header in [None, Some("Bearer "), Some("")] {
        let response = renew(&server, header).await?;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(challenge.starts_with("Bearer"), "got {:?}", challenge);
    }

    Ok(())
}

/// Tampered, forged and malformed tokens all get the same 401.
#[tokio::test]
async fn test_renewal_untrusted_tokens_unauthenticated() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;
    let now = chrono::Utc::now().timestamp();
    let genuine = server.issue_token_at("alice", 7, false, now)?;

    // Swap the payload for one claiming organizer rights
    let elevated = TestTokenBuilder::new().for_user("alice").organizer(true).sign(1)?;
    let elevated_payload = elevated.split('.').nth(1).unwrap_or_default();
    let mut parts: Vec<&str> = genuine.split('.').collect();
    parts[1] = elevated_payload;
    let tampered = parts.join(".");

    let forged = TestTokenBuilder::new().for_user("alice").sign(2)?;
    let wrong_kid = TestTokenBuilder::new().with_key_id("other-key").sign(1)?;

    let mut bodies = Vec::new();
    for token in [
        tampered,
        forged,
        wrong_kid,
        "not-a-jwt".to_string(),
        "a.b.c".to_string(),
    ] {
        // Act
        let response = renew(&server, Some(&format!("Bearer {}", token))).await?;

        // Assert
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(response.text().await?);
    }

    assert!(
        bodies.windows(2).all(|w| w[0] == w[1]),
        "Rejection bodies must not reveal the cause"
    );

    Ok(())
}

/// A correctly signed token with a non-numeric organization claim is rejected.
#[tokio::test]
async fn test_renewal_unparseable_organization_unauthenticated() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;

    let token = TestTokenBuilder::new()
        .for_user("alice")
        .with_raw_claim("IdOng", json!("seven"))
        .sign(1)?;

    let response = renew(&server, Some(&format!("Bearer {}", token))).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

/// Tokens built outside the issuer but signed with its key renew normally.
#[tokio::test]
async fn test_renewal_of_builder_token_with_server_key() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;

    let token = TestTokenBuilder::new()
        .for_user("carol")
        .with_organization(42)
        .issued_at(chrono::Utc::now().timestamp() - 86_400)
        .sign(1)?;

    let response = renew(&server, Some(&format!("Bearer {}", token))).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let renewed: String = response.json().await?;
    renewed.assert_for_subject("carol").assert_organization(42);

    Ok(())
}

/// Tokens for another issuer or audience, without a `kid`, or signed with a
/// different algorithm are never renewed.
#[tokio::test]
async fn test_renewal_foreign_tokens_unauthenticated() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;

    let cases = [
        (
            "wrong issuer",
            TestTokenBuilder::new()
                .for_user("alice")
                .with_issuer("https://other-issuer.test")
                .sign(1)?,
        ),
        (
            "wrong audience",
            TestTokenBuilder::new()
                .for_user("alice")
                .with_audience("billing")
                .sign(1)?,
        ),
        (
            "missing kid",
            TestTokenBuilder::new().for_user("alice").without_key_id().sign(1)?,
        ),
        (
            "HS256 on an EdDSA issuer",
            TestTokenBuilder::new()
                .for_user("alice")
                .sign_hmac(&test_hmac_secret())?,
        ),
    ];

    for (case, token) in cases {
        // Act
        let response = renew(&server, Some(&format!("Bearer {}", token))).await?;

        // Assert
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} should be rejected",
            case
        );
    }

    Ok(())
}

/// A token past its `exp` but inside its `nbf` still renews, with a new id.
#[tokio::test]
async fn test_renewal_lapsed_token_gets_new_token_id() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;
    let now = chrono::Utc::now().timestamp();

    let token = TestTokenBuilder::new()
        .for_user("dave")
        .with_token_id("lapsed-token")
        .issued_at(now - 600)
        .not_before(now - 600)
        .expires_at(now - 1)
        .sign(1)?;

    let response = renew(&server, Some(&format!("Bearer {}", token))).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let renewed: String = response.json().await?;
    renewed.assert_for_subject("dave").assert_expires_in(3600);
    assert_ne!(decode_payload(&renewed).jti, "lapsed-token");

    Ok(())
}
