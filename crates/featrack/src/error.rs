//! Error types for the Featrack SDK.

/// Errors that can occur when using the Featrack SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required argument was empty or missing.
    #[error("{0}")]
    Validation(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// `start` was called while a session is active or still starting.
    #[error("session already started")]
    SessionAlreadyStarted,

    /// The operation needs an active session.
    #[error("Session is not started")]
    SessionNotStarted,

    /// Usage tracking needs an identified customer.
    #[error("customer is not identified, cannot send usages")]
    NotIdentified,

    /// The client was never initialized (or its transport could not be built).
    #[error("Featrack SDK not initialized")]
    NotInitialized,

    /// The API answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing required field or bad configuration value.
    Validation,
    /// The session/identity state does not allow the operation.
    Precondition,
    /// Operation invoked before initialization.
    NotInitialized,
    /// Non-2xx response, network failure or an unreadable response body.
    Transport,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::Config(_) => ErrorKind::Validation,
            Error::SessionAlreadyStarted | Error::SessionNotStarted | Error::NotIdentified => {
                ErrorKind::Precondition
            }
            Error::NotInitialized => ErrorKind::NotInitialized,
            Error::Api { .. } | Error::Http(_) | Error::Serialization(_) => ErrorKind::Transport,
        }
    }

    /// HTTP status of an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
