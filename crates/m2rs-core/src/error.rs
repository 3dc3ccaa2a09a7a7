//! Shared error type across m2rs crates.

use thiserror::Error;

/// Stable error codes (used in logs and test vectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Input does not follow the grammar.
    Malformed,
    /// A declared length runs past the end of the buffer.
    OutOfBounds,
    /// Unrecognized TNetstring type tag.
    UnknownTag,
    /// Value has a different tag than the operation requires.
    TypeMismatch,
    /// Nesting limit exceeded.
    TooDeep,
    /// JSON text could not be parsed or produced.
    Json,
    /// Message exceeds the configured size cap.
    TooLarge,
    /// Endpoint creation, connect, send or receive failed.
    Transport,
    /// Transport context was torn down.
    Terminated,
    /// Invalid configuration.
    BadConfig,
}

impl ErrorCode {
    /// String representation used in logs and test vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Malformed => "MALFORMED",
            ErrorCode::OutOfBounds => "OUT_OF_BOUNDS",
            ErrorCode::UnknownTag => "UNKNOWN_TAG",
            ErrorCode::TypeMismatch => "TYPE_MISMATCH",
            ErrorCode::TooDeep => "TOO_DEEP",
            ErrorCode::Json => "JSON",
            ErrorCode::TooLarge => "TOO_LARGE",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Terminated => "TERMINATED",
            ErrorCode::BadConfig => "BAD_CONFIG",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, M2Error>;

/// Unified error type used by core and handler.
#[derive(Debug, Error)]
pub enum M2Error {
    #[error("malformed input: {0}")]
    Malformed(String),
    #[error("declared length {declared} exceeds the {available} bytes available")]
    OutOfBounds { declared: usize, available: usize },
    #[error("unknown type tag {0:#04x}")]
    UnknownTag(u8),
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("json: {0}")]
    Json(String),
    #[error("message of {size} bytes exceeds limit of {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("transport: {0}")]
    Transport(String),
    #[error("transport context terminated")]
    Terminated,
    #[error("bad config: {0}")]
    BadConfig(String),
}

impl M2Error {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            M2Error::Malformed(_) => ErrorCode::Malformed,
            M2Error::OutOfBounds { .. } => ErrorCode::OutOfBounds,
            M2Error::UnknownTag(_) => ErrorCode::UnknownTag,
            M2Error::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            M2Error::TooDeep(_) => ErrorCode::TooDeep,
            M2Error::Json(_) => ErrorCode::Json,
            M2Error::TooLarge { .. } => ErrorCode::TooLarge,
            M2Error::Transport(_) => ErrorCode::Transport,
            M2Error::Terminated => ErrorCode::Terminated,
            M2Error::BadConfig(_) => ErrorCode::BadConfig,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        M2Error::Malformed(msg.into())
    }
}

impl From<serde_json::Error> for M2Error {
    fn from(e: serde_json::Error) -> Self {
        M2Error::Json(e.to_string())
    }
}
