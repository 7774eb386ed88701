//! Unified SDK error types.

use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Workflow(#[from] WorkflowError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

/// WebSocket transport errors.
///
/// These never reach callers of `connect()` / `disconnect()`; the connection
/// manager routes them through its close-then-maybe-reconnect path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed { code: Option<u16>, reason: String },
}

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Token expired")]
    TokenExpired,
}

/// Finish-workflow errors, surfaced to the UI with a human-readable reason.
///
/// Every variant leaves the active giveaway unchanged; the workflow is back in
/// `Idle` by the time the caller sees the error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("A finish workflow is already in progress")]
    Busy,

    #[error("No active giveaway")]
    NoActiveGiveaway,

    #[error("Giveaway {0} is not active")]
    NotActive(String),

    #[error("Finish messages must be saved before finishing the giveaway")]
    MessagesNotReady,

    #[error("{reason}")]
    PersistFailed { reason: String },

    #[error("{reason}")]
    FinishFailed { reason: String },
}

impl WorkflowError {
    /// The collaborator-provided reason for persist/finish failures.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::PersistFailed { reason } | Self::FinishFailed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Wire → domain validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Inconsistent giveaway {id}: {detail}")]
    Inconsistent { id: String, detail: String },
}
