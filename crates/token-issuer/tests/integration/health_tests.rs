//! Integration tests for operational endpoints.

use issuer_test_utils::TestIssuerServer;
use reqwest::StatusCode;
use token_issuer::services::credential_store::mock::MockCredentialStore;

/// /health returns 200 OK with a plain body
#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;

    // Act
    let response = reqwest::Client::new()
        .get(format!("{}/health", server.url()))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

/// /metrics is reachable without authentication
#[tokio::test]
async fn test_metrics_endpoint_is_public() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(MockCredentialStore::new()).await?;

    let response = reqwest::Client::new()
        .get(format!("{}/metrics", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
