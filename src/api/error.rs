// ABOUTME: Error type for Pages API calls.
// ABOUTME: Distinguishes transport failures from platform-reported errors.

use thiserror::Error;

use super::types::ApiErrorEntry;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP request itself failed (connect, timeout, bad TLS, ...).
    #[error("request failed: {method} {path}: {source}")]
    Transport {
        method: &'static str,
        path: String,
        source: reqwest::Error,
    },

    /// The platform answered but reported failure in its response envelope.
    #[error("{method} {path} [{status}]: {}", format_error_entries(errors))]
    Platform {
        method: &'static str,
        path: String,
        status: u16,
        errors: Vec<ApiErrorEntry>,
    },

    /// The response body did not match the documented shape.
    #[error("unexpected response for {method} {path}: {detail}")]
    Decode {
        method: &'static str,
        path: String,
        detail: String,
    },

    /// The live log connection could not be established.
    #[error("live log connection failed: {0}")]
    LiveLogs(String),
}

/// Renders platform error entries the way the dashboard shows them,
/// one `message [code]` per line under a common banner.
fn format_error_entries(errors: &[ApiErrorEntry]) -> String {
    if errors.is_empty() {
        return "[Pages API error]".to_string();
    }

    let lines: Vec<String> = errors
        .iter()
        .map(|e| format!("{} [{}]", e.message, e.code))
        .collect();

    format!("[Pages API error]\n{}", lines.join("\n"))
}
