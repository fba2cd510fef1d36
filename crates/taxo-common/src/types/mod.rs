//! Shared domain types

pub mod taxid;

pub use taxid::{TaxId, TaxIdError};
