//! Error types for the banditry library.

use thiserror::Error;

/// Result type alias for bandit operations.
pub type Result<T> = std::result::Result<T, BanditError>;

/// Errors that can occur during bandit operations.
#[derive(Error, Debug)]
pub enum BanditError {
    /// A strategy or simulation was configured with zero arms.
    #[error("need at least 1 arm")]
    NoArmsAvailable,

    /// A 1-indexed arm outside `[1, arms]` was selected or updated.
    #[error("arm {arm} not in [1, {arms}]")]
    ArmOutOfRange { arm: usize, arms: usize },

    /// A snapshot or generator set does not match the strategy's arm count.
    #[error("cannot init {expected} arms with {got} arms")]
    ArmCountMismatch { expected: usize, got: usize },

    /// A snapshot describing zero arms.
    #[error("snapshot has no arms")]
    EmptySnapshot,

    /// A snapshot whose contents are inconsistent or malformed.
    #[error("invalid snapshot: {message}")]
    InvalidSnapshot { message: String },

    /// Invalid parameter value.
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The registry does not know the requested strategy.
    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    /// Wrong number of hyperparameters for a strategy.
    #[error("{strategy} takes {expected} parameter(s), got {got}")]
    ParameterCount {
        strategy: &'static str,
        expected: usize,
        got: usize,
    },

    /// Numerical computation error.
    #[error("numerical error: {message}")]
    NumericalError { message: String },

    /// Builder configuration error.
    #[error("builder error: {message}")]
    BuilderError { message: String },

    /// Background refresh was requested outside a tokio runtime.
    #[error("delayed strategy requires a running tokio runtime")]
    NoRuntime,

    /// The snapshot stream could not be opened or read.
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot stream was not valid JSON.
    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),
}
