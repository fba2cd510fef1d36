//! Error types for taxo

use thiserror::Error;

use crate::types::TaxIdError;

/// Result type alias for taxo operations
pub type Result<T> = std::result::Result<T, TaxoError>;

/// Main error type for taxo
#[derive(Error, Debug)]
pub enum TaxoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid taxonomic ID: {0}")]
    InvalidTaxId(#[from] TaxIdError),

    #[error("Parse error in {file} at line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl TaxoError {
    /// Create a parse error with file and line context
    pub fn parse(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}
