//! Turning HTTP responses into typed values or `TabulaError`s.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tabula_core::TabulaError;

/// Maps a transport-level failure.
pub(crate) fn transport_error(endpoint: &str, err: reqwest::Error) -> TabulaError {
    if err.is_timeout() {
        TabulaError::network(format!("{} timed out", endpoint))
    } else if err.is_connect() {
        TabulaError::network(format!("Could not reach the server ({})", endpoint))
    } else {
        TabulaError::network(format!("{}: {}", endpoint, err))
    }
}

/// Pulls a display message out of a structured error body.
///
/// Understands `{"detail": "..."}`, validation lists
/// `{"detail": [{"msg": "..."}]}` and `{"message": "..."}`. Anything else
/// (plain text, HTML, unrelated JSON) yields `None`.
pub fn error_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<serde_json::Value>(body.trim()).ok()?;

    let from_detail = match json.get("detail") {
        Some(serde_json::Value::String(detail)) => Some(detail.clone()),
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    };

    from_detail
        .or_else(|| {
            json.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .filter(|m| !m.trim().is_empty())
}

/// Maps a non-success response to an error.
///
/// A structured reason becomes [`TabulaError::Http`]. A raw one becomes
/// [`TabulaError::Opaque`], which callers replace with their own fallback.
pub fn status_error(status: StatusCode, body: &str) -> TabulaError {
    match error_message(body) {
        Some(message) => TabulaError::http(status.as_u16(), message),
        None => {
            let raw = body.trim();
            if raw.is_empty() {
                TabulaError::Opaque(format!("Request failed with status {}", status.as_u16()))
            } else {
                TabulaError::Opaque(raw.to_string())
            }
        }
    }
}

/// Checks the status and returns the body text of a successful response.
pub(crate) async fn success_body(endpoint: &str, response: Response) -> Result<String, TabulaError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(endpoint, e))?;

    if status == StatusCode::UNAUTHORIZED {
        return Err(TabulaError::Unauthorized);
    }

    if !status.is_success() {
        let err = status_error(status, &body);
        tracing::warn!("{} failed ({}): {}", endpoint, status, err);
        return Err(err);
    }

    Ok(body)
}

/// Decodes a success body into `T`, naming the endpoint on failure.
pub fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, TabulaError> {
    serde_json::from_str(body).map_err(|e| TabulaError::decode(endpoint, e.to_string()))
}
