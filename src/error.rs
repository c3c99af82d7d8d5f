//! Shield error types.
//!
//! The decision core never fails on malformed-but-well-typed input: empty
//! responses, missing fingerprints and garbage messages all degrade to a
//! normal [`Verdict`](crate::Verdict). Errors are reserved for invalid
//! construction input (`PreconditionFailed`), configuration problems, and
//! parse failures at the API boundary.

use thiserror::Error;

/// Shield errors.
#[derive(Error, Debug)]
pub enum ShieldError {
    /// Caller-supplied input violates an operation precondition.
    ///
    /// Raised instead of silently under-populating state, e.g. an empty
    /// fingerprint list passed to `build_baseline`.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Upstream model call failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Unknown cost tier name.
    #[error("Invalid cost tier: {0}")]
    InvalidTier(String),

    /// Unknown usage timeframe name.
    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for shield operations
pub type Result<T> = std::result::Result<T, ShieldError>;

impl From<toml::de::Error> for ShieldError {
    fn from(err: toml::de::Error) -> Self {
        ShieldError::Config(err.to_string())
    }
}
