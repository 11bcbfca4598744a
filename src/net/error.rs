//! Request failure taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! - `Transport`: no response at all.
//! - `Unauthorized`: 401. The client wrapper already cleared the session;
//!   screens must not paint their own banner over the forced login.
//! - `Rejected`: any other 4xx, usually with a FastAPI `detail`.
//! - `Server`: 5xx, shown as a generic message.
//! - `Decode`: a 2xx whose body does not match the expected schema.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

/// Shown whenever the server gave no structured detail.
pub const NETWORK_ERROR_MESSAGE: &str = "Erro de conexão com o servidor";
pub const SERVER_ERROR_MESSAGE: &str = "Erro no servidor";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unauthorized")]
    Unauthorized { detail: Option<String> },

    #[error("request rejected with status {status}")]
    Rejected { status: u16, detail: Option<String> },

    #[error("server error: status {status}")]
    Server { status: u16 },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Classify a non-success response.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => Self::Unauthorized { detail: extract_detail(body) },
            500..=599 => Self::Server { status },
            _ => Self::Rejected { status, detail: extract_detail(body) },
        }
    }

    /// HTTP status when a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Rejected { status, .. } | Self::Server { status } => Some(*status),
            Self::Transport(_) | Self::Decode(_) | Self::HttpClientBuild(_) => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Text for the screen's error banner: the server's detail verbatim when
    /// there is one, otherwise a generic network or server message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { detail: Some(detail) } | Self::Rejected { detail: Some(detail), .. } => {
                detail.clone()
            }
            Self::Server { .. } => SERVER_ERROR_MESSAGE.to_owned(),
            _ => NETWORK_ERROR_MESSAGE.to_owned(),
        }
    }
}

/// Pull the human-readable detail out of an error body.
///
/// FastAPI sends `{"detail": "..."}` for handled errors and
/// `{"detail": [{"msg": "..."}, ...]}` for validation failures.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let detail = match value.get("detail") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> =
                items.iter().filter_map(|item| item.get("msg").and_then(Value::as_str)).collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    };
    detail
        .or_else(|| value.get("message").and_then(Value::as_str).map(str::to_owned))
        .filter(|text| !text.trim().is_empty())
}
