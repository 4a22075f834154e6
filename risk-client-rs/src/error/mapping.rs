//! Error mapping for prediction service responses
//!
//! Converts non-2xx responses into our normalized ServiceError type.

use reqwest::StatusCode;
use serde_json::Value;

use super::ServiceError;
use crate::util::truncate_string;

/// Longest body excerpt carried into an error message
const MAX_BODY_EXCERPT: usize = 100;

/// Map a non-2xx HTTP response to a ServiceError
pub fn map_http_error(status: StatusCode, body: &str) -> ServiceError {
    // FastAPI-style services report errors as {"detail": ...}
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let message = json.get("message")
            .or_else(|| json.get("error"))
            .or_else(|| json.get("detail"))
            .and_then(|m| m.as_str());

        if let Some(message) = message {
            return ServiceError::http(status.as_u16(), message);
        }
    }

    // Fallback to status-based message
    let message = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, truncate_string(body.trim(), MAX_BODY_EXCERPT))
    };

    ServiceError::http(status.as_u16(), message)
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "validation",
        401 => "authentication",
        403 => "authorization",
        404 => "not_found",
        408 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}
