//! Unified error type for the crate.
//!
//! Every fallible operation returns [`Result`]. Validation and lookup failures
//! abort the triggering operation before any mutation is made; nothing is retried.

use thiserror::Error;

/// All errors produced by the library and the binary.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or holds an invalid value
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field (e.g. `customer_name`)
        field: &'static str,
        /// Human-readable reason
        message: String,
    },

    /// A referenced record does not exist (or is not visible to the caller)
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The durable key-value store rejected a read or write
    #[error("Persistence error: {message}")]
    Persistence {
        /// Description of the failed store operation
        message: String,
    },

    /// Ledger input that cannot produce meaningful balances
    #[error("Invalid expense data: {message}")]
    InvalidExpenseData {
        /// Why the input was rejected
        message: String,
    },

    /// A reservation status change that the lifecycle does not allow
    #[error("Cannot move reservation from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Configuration file problems
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Relational store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON encode/decode failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with a formatted message.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`] keyed by any displayable id.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
