//! CLI error types

use infra_store::StoreError;
use thiserror::Error;

/// Errors surfaced to the terminal
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Serialisation failed: {0}")]
    Serialisation(#[from] serde_json::Error),
}

/// CLI result alias
pub type Result<T> = std::result::Result<T, CliError>;
