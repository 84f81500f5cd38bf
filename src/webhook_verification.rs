//! # Slack Request Verification
//!
//! Verifies the `X-Slack-Signature` header of inbound Events API requests
//! using HMAC-SHA256 over `v0:{timestamp}:{body}` with constant-time comparison.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{HeaderMap, StatusCode};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::config::SlackConfig;

type HmacSha256 = Hmac<Sha256>;

pub const SLACK_SIGNATURE_HEADER: &str = "x-slack-signature";
pub const SLACK_TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

const SIGNATURE_VERSION: &str = "v0";

/// Errors that can occur during webhook signature verification
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Missing required signature header: {header}")]
    MissingSignature { header: String },

    #[error("Invalid signature format: {header}")]
    InvalidSignatureFormat { header: String },

    #[error("Signature verification failed")]
    VerificationFailed,

    #[error("Missing required timestamp header: {header}")]
    MissingTimestamp { header: String },

    #[error("Invalid timestamp format: {header}")]
    InvalidTimestamp { header: String },

    #[error("Timestamp too old: {seconds}s old, max allowed: {max_seconds}s")]
    TimestampTooOld { seconds: u64, max_seconds: u64 },

    #[error("Timestamp too far in future: {seconds}s in future, max allowed: {max_seconds}s")]
    TimestampTooFuture { seconds: u64, max_seconds: u64 },

    #[error("Slack signing secret is not configured")]
    NotConfigured,
}

impl VerificationError {
    /// Returns the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            VerificationError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Result type for webhook verification
pub type VerificationResult<T> = Result<T, VerificationError>;

/// Computes the `v0=<hex>` signature Slack sends for `body` at `timestamp`.
pub fn sign_slack_request(body: &[u8], timestamp: &str, secret: &str) -> VerificationResult<String> {
    let digest = compute_digest(body, timestamp, secret)?;
    Ok(format!("{}={}", SIGNATURE_VERSION, hex::encode(digest)))
}

fn compute_digest(body: &[u8], timestamp: &str, secret: &str) -> VerificationResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| VerificationError::VerificationFailed)?;
    // The body is signed as raw bytes, never re-encoded.
    mac.update(format!("{SIGNATURE_VERSION}:{timestamp}:").as_bytes());
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verifies a Slack v0 signature with timestamp validation
pub fn verify_slack_signature(
    body: &[u8],
    signature_header: &str,
    timestamp_header: &str,
    secret: &str,
    tolerance_seconds: u64,
) -> VerificationResult<()> {
    debug!(
        body_size = body.len(),
        tolerance_seconds, "Starting Slack signature verification"
    );

    if signature_header.is_empty() {
        return Err(VerificationError::MissingSignature {
            header: "X-Slack-Signature".to_string(),
        });
    }

    if timestamp_header.is_empty() {
        return Err(VerificationError::MissingTimestamp {
            header: "X-Slack-Request-Timestamp".to_string(),
        });
    }

    let timestamp =
        timestamp_header
            .parse::<u64>()
            .map_err(|_| VerificationError::InvalidTimestamp {
                header: "X-Slack-Request-Timestamp must be a valid Unix timestamp".to_string(),
            })?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| VerificationError::InvalidTimestamp {
            header: "Failed to get current time".to_string(),
        })?
        .as_secs();

    let time_diff = now.abs_diff(timestamp);
    if time_diff > tolerance_seconds {
        return Err(if now > timestamp {
            VerificationError::TimestampTooOld {
                seconds: time_diff,
                max_seconds: tolerance_seconds,
            }
        } else {
            VerificationError::TimestampTooFuture {
                seconds: time_diff,
                max_seconds: tolerance_seconds,
            }
        });
    }

    let Some(provided_hex) = signature_header.strip_prefix("v0=") else {
        return Err(VerificationError::InvalidSignatureFormat {
            header: "X-Slack-Signature must start with 'v0='".to_string(),
        });
    };

    let provided_bytes =
        hex::decode(provided_hex).map_err(|_| VerificationError::InvalidSignatureFormat {
            header: "X-Slack-Signature contains invalid hex".to_string(),
        })?;

    let expected = compute_digest(body, timestamp_header, secret)?;
    if subtle::ConstantTimeEq::ct_eq(&expected[..], &provided_bytes[..]).into() {
        Ok(())
    } else {
        Err(VerificationError::VerificationFailed)
    }
}

/// Verifies an inbound Slack request against the configured signing secret.
pub fn verify_slack_request(
    headers: &HeaderMap,
    body: &[u8],
    config: &SlackConfig,
) -> VerificationResult<()> {
    let secret = config
        .signing_secret
        .as_deref()
        .filter(|secret| !secret.is_empty())
        .ok_or(VerificationError::NotConfigured)?;

    let signature_header = headers
        .get(SLACK_SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let timestamp_header = headers
        .get(SLACK_TIMESTAMP_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    verify_slack_signature(
        body,
        signature_header,
        timestamp_header,
        secret,
        config.tolerance_seconds,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn slack_config(secret: Option<&str>) -> SlackConfig {
        SlackConfig {
            signing_secret: secret.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_slack_signature_verification_success() {
        let body = br#"{"type":"event_callback"}"#;
        let timestamp = now().to_string();
        let signature = sign_slack_request(body, &timestamp, "test_secret").unwrap();

        assert!(verify_slack_signature(body, &signature, &timestamp, "test_secret", 300).is_ok());
    }

    #[test]
    fn test_slack_signature_wrong_secret_fails() {
        let body = b"payload";
        let timestamp = now().to_string();
        let signature = sign_slack_request(body, &timestamp, "other_secret").unwrap();

        assert!(matches!(
            verify_slack_signature(body, &signature, &timestamp, "test_secret", 300),
            Err(VerificationError::VerificationFailed)
        ));
    }

    #[test]
    fn test_slack_signature_tampered_body_fails() {
        let timestamp = now().to_string();
        let signature = sign_slack_request(b"original", &timestamp, "test_secret").unwrap();

        assert!(verify_slack_signature(b"tampered", &signature, &timestamp, "test_secret", 300).is_err());
    }

    #[test]
    fn test_slack_signature_covers_raw_body_bytes() {
        let timestamp = now().to_string();
        let signature = sign_slack_request(b"text=\xff", &timestamp, "test_secret").unwrap();

        let mut mac = HmacSha256::new_from_slice(b"test_secret").unwrap();
        mac.update(format!("v0:{timestamp}:text=").as_bytes());
        mac.update(&[0xff]);
        assert_eq!(signature, format!("v0={}", hex::encode(mac.finalize().into_bytes())));

        assert!(verify_slack_signature(b"text=\xff", &signature, &timestamp, "test_secret", 300).is_ok());
        assert!(matches!(
            verify_slack_signature(b"text=\xfe", &signature, &timestamp, "test_secret", 300),
            Err(VerificationError::VerificationFailed)
        ));
    }

    #[test]
    fn test_slack_signature_verification_timestamp_too_old() {
        let body = b"test payload";
        let timestamp = (now() - 400).to_string();
        let signature = sign_slack_request(body, &timestamp, "test_secret").unwrap();

        assert!(matches!(
            verify_slack_signature(body, &signature, &timestamp, "test_secret", 300),
            Err(VerificationError::TimestampTooOld { .. })
        ));
    }

    #[test]
    fn test_slack_signature_verification_timestamp_in_future() {
        let body = b"test payload";
        let timestamp = (now() + 400).to_string();
        let signature = sign_slack_request(body, &timestamp, "test_secret").unwrap();

        assert!(matches!(
            verify_slack_signature(body, &signature, &timestamp, "test_secret", 300),
            Err(VerificationError::TimestampTooFuture { .. })
        ));
    }

    #[test]
    fn test_slack_signature_verification_invalid_timestamp() {
        let result =
            verify_slack_signature(b"test payload", "v0=abcd", "invalid_timestamp", "secret", 300);
        assert!(matches!(result, Err(VerificationError::InvalidTimestamp { .. })));
    }

    #[test]
    fn test_slack_signature_requires_v0_prefix() {
        let timestamp = now().to_string();
        let signature = sign_slack_request(b"body", &timestamp, "secret")
            .unwrap()
            .replacen("v0=", "v1=", 1);

        assert!(matches!(
            verify_slack_signature(b"body", &signature, &timestamp, "secret", 300),
            Err(VerificationError::InvalidSignatureFormat { .. })
        ));
    }

    #[test]
    fn test_request_without_secret_is_not_configured() {
        let err = verify_slack_request(&HeaderMap::new(), b"{}", &slack_config(None)).unwrap_err();
        assert!(matches!(err, VerificationError::NotConfigured));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_request_headers_are_read_case_insensitively() {
        let body = b"{}";
        let timestamp = now().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Slack-Signature",
            sign_slack_request(body, &timestamp, "secret")
                .unwrap()
                .parse()
                .unwrap(),
        );
        headers.insert("X-Slack-Request-Timestamp", timestamp.parse().unwrap());

        assert!(verify_slack_request(&headers, body, &slack_config(Some("secret"))).is_ok());
    }

    #[test]
    fn test_missing_headers_are_unauthorized() {
        let err = verify_slack_request(&HeaderMap::new(), b"{}", &slack_config(Some("secret")))
            .unwrap_err();
        assert!(matches!(err, VerificationError::MissingSignature { .. }));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
