//! Client-side error normalisation.
//!
//! Transport failures, timeouts and non-2xx responses all become a
//! [`ClientError`]; [`handle_error`] then classifies it for display and retry
//! decisions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A failed API call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ClientError {
    /// HTTP status, absent when no response arrived.
    pub status: Option<u16>,
    pub message: String,
    /// Parsed response body, when there was one.
    pub data: Option<Value>,
    /// The request was abandoned after its deadline.
    pub timed_out: bool,
}

impl ClientError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            data: None,
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            timed_out: true,
            ..Self::network(message)
        }
    }

    pub fn http(status: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            data,
            timed_out: false,
        }
    }

    /// Response body could not be decoded.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::network(format!("Invalid response: {}", message.into()))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::decode(err.to_string())
        } else {
            match err.status() {
                Some(status) => ClientError::http(status.as_u16(), err.to_string(), None),
                None => ClientError::network(err.to_string()),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    RateLimit,
    Server,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Validation => "validation",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Authorization => "authorization",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Server => "server",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn can_retry(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::RateLimit | ErrorKind::Server
        )
    }

    fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Network error. Please check your connection.",
            ErrorKind::Timeout => "Request timed out. Please try again.",
            ErrorKind::Validation => "Please check your input and try again.",
            ErrorKind::Authentication => "Please sign in to continue.",
            ErrorKind::Authorization => "You do not have permission to do that.",
            ErrorKind::NotFound => "The requested resource was not found.",
            ErrorKind::Conflict => "This resource already exists.",
            ErrorKind::RateLimit => "Too many requests. Please slow down.",
            ErrorKind::Server => "Server error. Please try again later.",
            ErrorKind::Unknown => "Something went wrong.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a [`ClientError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandledError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    pub can_retry: bool,
}

fn classify(err: &ClientError) -> ErrorKind {
    if err.timed_out {
        return ErrorKind::Timeout;
    }
    match err.status {
        None => ErrorKind::Network,
        Some(400) | Some(422) => ErrorKind::Validation,
        Some(401) => ErrorKind::Authentication,
        Some(403) => ErrorKind::Authorization,
        Some(404) => ErrorKind::NotFound,
        Some(409) => ErrorKind::Conflict,
        Some(429) => ErrorKind::RateLimit,
        Some(status) if (500..600).contains(&status) => ErrorKind::Server,
        Some(_) => ErrorKind::Unknown,
    }
}

/// Map an error to a user-facing kind, message and retry hint.
///
/// The server's own message is preferred for client errors; transport and
/// server failures get a generic message.
pub fn handle_error(err: &ClientError) -> HandledError {
    let kind = classify(err);
    let server_message = err
        .data
        .as_ref()
        .and_then(|data| data.get("message"))
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty());

    let message = match (kind, server_message) {
        (ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Server, _) => {
            kind.default_message().to_string()
        }
        (_, Some(message)) => message.to_string(),
        (_, None) => kind.default_message().to_string(),
    };

    HandledError {
        kind,
        message,
        can_retry: kind.can_retry(),
    }
}
