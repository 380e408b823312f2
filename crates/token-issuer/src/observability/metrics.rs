//! Metrics definitions for the token issuer.
//!
//! All metrics follow Prometheus naming conventions:
//! - `issuer_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `flow`: login, renewal
//! - `status`: success, error
//! - `mode`: strict, renewal
//! - `reason`: none, malformed, bad_signature, expired
//! - `outcome`: match, no_match, error

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle that renders
/// `GET /metrics`.
///
/// Must be called before any metric is recorded. Issuance buckets are sized
/// for a signing path that is dominated by bcrypt on login.
///
/// # Errors
///
/// Returns error if a recorder is already installed in this process.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("issuer_token_issuance".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500,
            ],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record token issuance duration and outcome
///
/// Metric: `issuer_token_issuance_duration_seconds`, `issuer_token_issuance_total`
/// Labels: `flow`, `status`
pub fn record_token_issuance(flow: &str, status: &str, duration: Duration) {
    histogram!("issuer_token_issuance_duration_seconds", "flow" => flow.to_string(), "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("issuer_token_issuance_total", "flow" => flow.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record token validation result
///
/// Metric: `issuer_token_validations_total`
/// Labels: `mode`, `status`, `reason`
pub fn record_token_validation(mode: &str, status: &str, reason: &str) {
    counter!("issuer_token_validations_total",
        "mode" => mode.to_string(),
        "status" => status.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

// ============================================================================
// Credential Store Metrics
// ============================================================================

/// Record a credential store lookup
///
/// Metric: `issuer_credential_lookups_total`
/// Labels: `outcome`
pub fn record_credential_lookup(outcome: &str) {
    counter!("issuer_credential_lookups_total", "outcome" => outcome.to_string()).increment(1);
}
