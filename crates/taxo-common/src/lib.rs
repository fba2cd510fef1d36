//! Taxo Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, error handling and logging setup for the taxo workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`TaxoError`] and the [`Result`] alias
//! - **Types**: [`TaxId`], the validated NCBI taxonomic identifier
//! - **Logging**: tracing subscriber initialization driven by `LOG_*` variables
//!
//! # Example
//!
//! ```
//! use taxo_common::TaxId;
//!
//! let human: TaxId = "9606".parse().unwrap();
//! assert_eq!(human.get(), 9606);
//! assert!("-1".parse::<TaxId>().is_err());
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TaxoError};
pub use types::{TaxId, TaxIdError};
