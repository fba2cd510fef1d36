//! Shared utilities for feature modules
//!
//! - **validation**: content-type, body and taxonomic ID checks

pub mod validation;

pub use validation::{json_body, parse_taxids, required_field, RequestValidationError};

use crate::error::ApiError;

/// Fallback for known routes hit with a method they do not serve
///
/// Answers 400 rather than 405, which is what existing clients expect.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
