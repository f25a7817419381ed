//! Error types for the swap engine

use thiserror::Error;

/// Result type for swap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Swap engine errors
///
/// Every variant aborts the invocation before its write set is committed.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed, missing or out-of-range argument, or wrong argument count
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity is absent
    #[error("{kind} does not exist: {id}")]
    NotFound {
        /// Entity kind (`Battery`, `Network`, ...)
        kind: &'static str,
        /// Requested identifier
        id: String,
    },

    /// Duplicate identifier on create
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Entity kind
        kind: &'static str,
        /// Duplicate identifier
        id: String,
    },

    /// Wrong lifecycle state, company or ownership mismatch
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Checked arithmetic rejected a counter or wallet update
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Ledger adapter or document codec failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable label, used as a metrics dimension
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::NotFound { .. } => "not_found",
            Error::AlreadyExists { .. } => "already_exists",
            Error::Precondition(_) => "precondition",
            Error::ArithmeticOverflow(_) => "arithmetic_overflow",
            Error::Persistence(_) => "persistence",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }

    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        Error::AlreadyExists {
            kind,
            id: id.into(),
        }
    }
}

impl From<ledger_core::Error> for Error {
    fn from(err: ledger_core::Error) -> Self {
        match err {
            // Caller-supplied keys and queries
            ledger_core::Error::InvalidKey(msg) | ledger_core::Error::InvalidQuery(msg) => {
                Error::Validation(msg)
            }
            ledger_core::Error::Config(msg) => Error::Config(msg),
            other => Error::Persistence(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Persistence(format!("document codec: {}", err))
    }
}
