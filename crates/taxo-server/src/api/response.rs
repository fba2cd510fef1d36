//! API response envelope
//!
//! Every answer of the taxonomy endpoints is a JSON object with a `success`
//! flag. Client errors carry a `reason`, server errors an `error`, and a
//! successful call carries either `terms` or `tree`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use taxo_common::TaxId;

use crate::features::tree::TaxonomicNode;

#[derive(Debug, Serialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<BTreeMap<TaxId, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<BTreeMap<TaxId, TaxonomicNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    fn empty(success: bool) -> Self {
        Self {
            success,
            reason: None,
            terms: None,
            tree: None,
            error: None,
        }
    }

    /// Successful name translation
    pub fn terms(terms: BTreeMap<TaxId, String>) -> Self {
        Self {
            terms: Some(terms),
            ..Self::empty(true)
        }
    }

    /// Successful tree construction
    pub fn tree(tree: BTreeMap<TaxId, TaxonomicNode>) -> Self {
        Self {
            tree: Some(tree),
            ..Self::empty(true)
        }
    }

    /// Request refused by the server (4xx)
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::empty(false)
        }
    }

    /// Request that failed on the server side (5xx)
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(false)
        }
    }

    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terms_envelope() {
        let terms = BTreeMap::from([(TaxId::new(9606).unwrap(), "Homo sapiens".to_string())]);
        assert_eq!(
            serde_json::to_value(ResponseEnvelope::terms(terms)).unwrap(),
            json!({ "success": true, "terms": { "9606": "Homo sapiens" } })
        );
    }

    #[test]
    fn test_rejected_envelope() {
        assert_eq!(
            serde_json::to_value(ResponseEnvelope::rejected("Bad content type")).unwrap(),
            json!({ "success": false, "reason": "Bad content type" })
        );
    }

    #[test]
    fn test_failed_envelope() {
        assert_eq!(
            serde_json::to_value(ResponseEnvelope::failed("disk I/O error")).unwrap(),
            json!({ "success": false, "error": "disk I/O error" })
        );
    }
}
