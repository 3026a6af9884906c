use reqwest::Response;
use serde_json::Value;

use crate::error::{service_error, VetbookError};

// Include the client module
pub mod client;

/// Extracts a human-readable reason from an error body.
///
/// JSON objects contribute their `error` or `message` field; any other
/// non-empty body is used verbatim. Empty bodies yield `fallback`.
pub fn error_message_from_body(body: &str, fallback: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["error", "message"] {
            if let Some(Value::String(reason)) = map.get(key) {
                if !reason.trim().is_empty() {
                    return reason.trim().to_string();
                }
            }
        }
        return fallback.to_string();
    }

    trimmed.to_string()
}

/// Passes a successful response through, or turns a non-success one into a
/// `ServiceError` carrying the body's reason.
pub async fn ensure_success(response: Response, fallback: &str) -> Result<Response, VetbookError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message_from_body(&body, fallback);
    tracing::warn!("service returned {}: {}", status, message);
    Err(service_error(status.as_u16(), message))
}
