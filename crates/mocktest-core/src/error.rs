//! Session error types.
//!
//! Every failure a user intent can produce is one of these variants. None of
//! them are fatal: the front-end reports the error and keeps the attempt
//! alive, and the rejected intent leaves all state untouched.

use std::fmt;

use thiserror::Error;

/// Errors raised by the session controller, the bank editor and importers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// A required input is missing or out of range.
    #[error("{0}")]
    Validation(String),

    /// An import payload is malformed or has the wrong shape.
    #[error("invalid import format: {0}")]
    ImportFormat(String),

    /// The input file type cannot be imported.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// The action is not allowed in the current phase of the attempt.
    #[error("cannot {action} while the test is {state}")]
    State { action: &'static str, state: String },
}

/// Coarse classification of a [`SessionError`], used by front-ends to pick
/// how a notice is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    ImportFormat,
    UnsupportedInput,
    State,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::ImportFormat => write!(f, "import format"),
            ErrorKind::UnsupportedInput => write!(f, "unsupported input"),
            ErrorKind::State => write!(f, "state"),
        }
    }
}

impl SessionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SessionError::Validation(msg.into())
    }

    pub fn import_format(msg: impl Into<String>) -> Self {
        SessionError::ImportFormat(msg.into())
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Validation(_) => ErrorKind::Validation,
            SessionError::ImportFormat(_) => ErrorKind::ImportFormat,
            SessionError::UnsupportedInput(_) => ErrorKind::UnsupportedInput,
            SessionError::State { .. } => ErrorKind::State,
        }
    }

    /// Session errors never end the attempt; the user corrects the action
    /// and tries again.
    pub fn is_recoverable(&self) -> bool {
        true
    }
}

/// Convenience alias for results carrying a [`SessionError`].
pub type SessionResult<T> = std::result::Result<T, SessionError>;
