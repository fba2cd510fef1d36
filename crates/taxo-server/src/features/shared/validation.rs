//! Request validation shared by the taxonomy endpoints
//!
//! Both endpoints take a JSON body carrying a list of taxonomic IDs. The
//! checks run in a fixed order (content type, body, field presence, field
//! type, ID parsing) and the first failure becomes a 400 with the matching
//! reason.

use axum::http::{header, HeaderMap};
use serde_json::Value;
use taxo_common::{TaxId, TaxIdError};
use thiserror::Error;

/// Errors that can occur while validating a request body
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("Bad content type")]
    BadContentType,

    #[error("Malformed JSON body")]
    MalformedBody,

    #[error("Taxonomic IDs are missing")]
    MissingField { field: &'static str },

    #[error("{reason}")]
    WrongType {
        field: &'static str,
        reason: &'static str,
    },

    #[error("One of the sended IDs is not a valid integer")]
    InvalidTaxId { position: usize, cause: TaxIdError },
}

/// Check the content type and decode the body as JSON
///
/// Accepts `application/json` and `application/*+json`, with or without
/// parameters such as `charset`.
pub fn json_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, RequestValidationError> {
    if !has_json_content_type(headers) {
        return Err(RequestValidationError::BadContentType);
    }

    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected malformed JSON body");
        RequestValidationError::MalformedBody
    })
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Look up a required field of a JSON object body
pub fn required_field<'a>(
    body: &'a Value,
    field: &'static str,
) -> Result<&'a Value, RequestValidationError> {
    body.as_object()
        .and_then(|object| object.get(field))
        .ok_or(RequestValidationError::MissingField { field })
}

/// Parse one JSON element (string or integer) into a taxonomic ID
pub fn parse_taxid(value: &Value) -> Result<TaxId, TaxIdError> {
    match value {
        Value::String(s) => s.parse(),
        Value::Number(n) => {
            if let Some(unsigned) = n.as_u64() {
                TaxId::try_from(unsigned)
            } else if let Some(signed) = n.as_i64() {
                TaxId::try_from(signed)
            } else {
                Err(TaxIdError::NotAnInteger(n.to_string()))
            }
        },
        other => Err(TaxIdError::NotAnInteger(other.to_string())),
    }
}

/// Parse every element or fail on the first one that is not a valid ID
pub fn parse_taxids(values: &[Value]) -> Result<Vec<TaxId>, RequestValidationError> {
    values
        .iter()
        .enumerate()
        .map(|(position, value)| {
            parse_taxid(value).map_err(|cause| {
                tracing::debug!(position, error = %cause, "Rejected taxonomic ID");
                RequestValidationError::InvalidTaxId { position, cause }
            })
        })
        .collect()
}
