use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Access token expired at {expired_at}")]
    TokenExpired { expired_at: DateTime<Utc> },

    #[error("HTTP {status}: {}", summarize_body(.body))]
    Http { status: u16, body: Value },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
        None => body.to_string(),
        Some((cut, _)) => format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        ),
    }
}

/// One-line rendering of an error payload for `Display`.
fn summarize_body(body: &Value) -> String {
    let field = |key: &str| body.get(key).and_then(value_as_string);
    match (field("name"), field("code"), field("message")) {
        (name, code, Some(message)) => {
            let prefix: Vec<String> = [name, code].into_iter().flatten().collect();
            if prefix.is_empty() {
                truncate_body(&message)
            } else {
                format!("{} - {}", prefix.join(" "), truncate_body(&message))
            }
        }
        _ => match body {
            Value::String(text) => truncate_body(text),
            other => truncate_body(&other.to_string()),
        },
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ApiError {
    /// Build an HTTP error from a non-success status and the raw response text.
    ///
    /// The body is kept as decoded JSON when it parses, otherwise as a JSON string.
    pub fn from_status(status: u16, text: &str) -> Self {
        let body = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        ApiError::Http { status, body }
    }

    /// HTTP status for `Http` errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded error payload for `Http` errors
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Server-provided error code, if the payload carries one
    pub fn code(&self) -> Option<String> {
        self.body_field("code")
    }

    /// Server-provided error message, if the payload carries one
    pub fn message(&self) -> Option<String> {
        self.body_field("message")
    }

    /// Server-provided error name (e.g. `NotAuthenticated`), if present
    pub fn name(&self) -> Option<String> {
        self.body_field("name")
    }

    /// 4xx and 5xx are both reported as `Http`; this lets callers tell them apart.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    fn body_field(&self, key: &str) -> Option<String> {
        self.body()
            .and_then(|body| body.get(key))
            .and_then(value_as_string)
    }
}
