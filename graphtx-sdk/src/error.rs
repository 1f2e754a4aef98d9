//! Error types for the GraphTx SDK

use graphtx::EngineError;
use thiserror::Error;

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for GraphTx SDK operations
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the core engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Misuse of a transaction guard
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Type conversion errors
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// Resource not found errors
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Underlying engine error, if this is one
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Error::Engine(e) => Some(e),
            _ => None,
        }
    }
}
