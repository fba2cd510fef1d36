//! NCBI taxonomic identifiers
//!
//! A [`TaxId`] is always a positive integer. Clients send identifiers either as
//! JSON strings (`"9606"`) or JSON integers (`9606`); both paths end up here so
//! the acceptance rules live in one place.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing a taxonomic identifier
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxIdError {
    #[error("Taxonomic ID cannot be empty")]
    Empty,

    #[error("'{0}' is not a valid integer")]
    NotAnInteger(String),

    #[error("Taxonomic ID must be positive, got {0}")]
    NotPositive(String),

    #[error("Taxonomic ID {0} is out of range")]
    OutOfRange(String),
}

/// A positive NCBI taxonomy identifier (e.g. 9606 for Homo sapiens)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaxId(u32);

impl TaxId {
    /// The root of the NCBI classification
    pub const ROOT: TaxId = TaxId(1);

    /// Create a TaxId, rejecting zero
    pub fn new(value: u32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Value as stored in SQLite INTEGER columns
    pub fn as_i64(self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxId {
    type Err = TaxIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TaxIdError::Empty);
        }

        if let Some(rest) = trimmed.strip_prefix('-') {
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TaxIdError::NotPositive(trimmed.to_string()));
            }
        }

        // u32::from_str would accept a leading '+', which we do not
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TaxIdError::NotAnInteger(trimmed.to_string()));
        }

        let value: u32 = trimmed
            .parse()
            .map_err(|_| TaxIdError::OutOfRange(trimmed.to_string()))?;

        TaxId::new(value).ok_or_else(|| TaxIdError::NotPositive(trimmed.to_string()))
    }
}

impl TryFrom<i64> for TaxId {
    type Error = TaxIdError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(TaxIdError::NotPositive(value.to_string()));
        }
        u32::try_from(value)
            .map(TaxId)
            .map_err(|_| TaxIdError::OutOfRange(value.to_string()))
    }
}

impl TryFrom<u64> for TaxId {
    type Error = TaxIdError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        let value = u32::try_from(value).map_err(|_| TaxIdError::OutOfRange(value.to_string()))?;
        TaxId::new(value).ok_or_else(|| TaxIdError::NotPositive(value.to_string()))
    }
}
