//! Error types for the affinity core.

use thiserror::Error;

/// Top-level error type for all affinity operations.
#[derive(Error, Debug)]
pub enum AffinityError {
    /// A stored record exists but could not be parsed.
    ///
    /// No repair is attempted; the caller decides what to do with the file.
    #[error("Corrupt {record} record for user '{user}': {reason}")]
    Corrupt {
        /// Which record kind failed (`beliefs` or `log`).
        record: &'static str,
        /// Sanitized user identifier.
        user: String,
        /// Parser message.
        reason: String,
    },

    /// Serialization failure while writing a record.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, AffinityError>;
