//! Shared-secret authentication for scheduler-triggered endpoints.
//!
//! The external scheduler sends the secret either as `x-cron-secret` or as
//! `Authorization: Bearer <secret>`.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use slotwise_common::error::AppError;

use crate::state::AppState;

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Marker extractor: present only on requests carrying the configured cron secret.
///
/// ```ignore
/// async fn handler(_auth: CronAuth) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

/// Pull the presented secret out of the request headers.
pub fn presented_secret(headers: &HeaderMap) -> Option<&str> {
    if let Some(secret) = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return Some(secret);
    }

    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Compare without short-circuiting on the first differing byte.
pub fn secrets_match(expected: &str, presented: &str) -> bool {
    let (expected, presented) = (expected.as_bytes(), presented.as_bytes());
    if expected.is_empty() || expected.len() != presented.len() {
        return false;
    }

    expected
        .iter()
        .zip(presented)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

impl FromRequestParts<AppState> for CronAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match presented_secret(&parts.headers) {
            Some(secret) if secrets_match(&state.config.cron_secret, secret) => Ok(CronAuth),
            Some(_) => {
                tracing::warn!(path = %parts.uri.path(), "Rejected cron request with invalid secret");
                Err(AppError::Auth("Invalid cron secret".to_string()))
            }
            None => Err(AppError::Auth(format!(
                "Missing cron secret. Use '{}: <secret>' or 'Authorization: Bearer <secret>'",
                CRON_SECRET_HEADER
            ))),
        }
    }
}
