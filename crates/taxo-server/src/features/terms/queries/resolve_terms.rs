use serde_json::Value;
use std::collections::BTreeMap;
use taxo_common::TaxId;

use crate::cache::{LookupError, NameCache};
use crate::features::shared::{parse_taxids, RequestValidationError};
use crate::taxonomy::{SourceError, TaxonomySource};

pub const TERM_FIELD: &str = "term";
pub const TERM_TYPE_REASON: &str =
    "Taxonomic IDs must be sended as a string array or a simple string";

/// The `term` field of a request: one ID or a list of them
#[derive(Debug, Clone, PartialEq)]
pub enum TermArgument {
    Single(String),
    Many(Vec<Value>),
}

impl TermArgument {
    pub fn from_json(value: &Value) -> Result<Self, RequestValidationError> {
        match value {
            Value::String(s) => Ok(Self::Single(s.clone())),
            Value::Array(items) => Ok(Self::Many(items.clone())),
            _ => Err(RequestValidationError::WrongType {
                field: TERM_FIELD,
                reason: TERM_TYPE_REASON,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolveTermsQuery {
    pub term: TermArgument,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveTermsError {
    #[error(transparent)]
    InvalidArgument(#[from] RequestValidationError),

    #[error("Term not found")]
    NotFound(Vec<TaxId>),

    #[error("Taxonomy source error: {0}")]
    Source(#[from] SourceError),
}

impl From<LookupError> for ResolveTermsError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(ids) => Self::NotFound(ids),
            LookupError::Source(e) => Self::Source(e),
        }
    }
}

impl ResolveTermsQuery {
    /// Parse every requested ID; a single invalid one rejects the whole query
    pub fn validate(&self) -> Result<Vec<TaxId>, ResolveTermsError> {
        let ids = match &self.term {
            TermArgument::Single(s) => parse_taxids(&[Value::String(s.clone())])?,
            TermArgument::Many(items) => parse_taxids(items)?,
        };
        Ok(ids)
    }
}

/// Resolve the scientific name of every requested taxon
///
/// IDs are validated before a handle is acquired, so a malformed request
/// never touches the data source. Duplicates collapse into one entry.
pub async fn handle(
    source: &dyn TaxonomySource,
    cache: &NameCache,
    query: ResolveTermsQuery,
) -> Result<BTreeMap<TaxId, String>, ResolveTermsError> {
    let ids = query.validate()?;
    if ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut handle = source.acquire().await?;
    let terms = cache.lookup(handle.as_mut(), &ids).await?;
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{InMemoryTaxonomy, TaxonomyIndex};
    use serde_json::json;

    fn id(value: u32) -> TaxId {
        TaxId::new(value).unwrap()
    }

    fn source() -> InMemoryTaxonomy {
        let mut index = TaxonomyIndex::new();
        index.insert_taxon(id(1), id(1), "root");
        index.insert_taxon(id(9606), id(1), "Homo sapiens");
        index.insert_taxon(id(9598), id(1), "Pan troglodytes");
        index.insert_merged(id(63221), id(9606));
        InMemoryTaxonomy::new(index)
    }

    fn query(value: Value) -> ResolveTermsQuery {
        ResolveTermsQuery {
            term: TermArgument::from_json(&value).unwrap(),
        }
    }

    #[test]
    fn test_term_argument_shapes() {
        assert_eq!(
            TermArgument::from_json(&json!("9606")).unwrap(),
            TermArgument::Single("9606".to_string())
        );
        assert!(matches!(
            TermArgument::from_json(&json!(["9606"])).unwrap(),
            TermArgument::Many(_)
        ));

        let err = TermArgument::from_json(&json!(9606)).unwrap_err();
        assert_eq!(err.to_string(), TERM_TYPE_REASON);
        assert!(TermArgument::from_json(&json!({ "id": "9606" })).is_err());
    }

    #[tokio::test]
    async fn test_single_term() {
        let source = source();
        let terms = handle(&source, &NameCache::new(), query(json!("9606")))
            .await
            .unwrap();

        assert_eq!(terms.len(), 1);
        assert_eq!(terms[&id(9606)], "Homo sapiens");
    }

    #[tokio::test]
    async fn test_duplicates_collapse() {
        let source = source();
        let terms = handle(&source, &NameCache::new(), query(json!(["9606", "9606", 9598])))
            .await
            .unwrap();

        assert_eq!(terms.len(), 2);
    }

    #[tokio::test]
    async fn test_merged_id_answers_with_current_name() {
        let source = source();
        let terms = handle(&source, &NameCache::new(), query(json!(["63221"])))
            .await
            .unwrap();

        assert_eq!(terms[&id(63221)], "Homo sapiens");
    }

    #[tokio::test]
    async fn test_invalid_id_never_reaches_source() {
        let source = source();
        let result = handle(&source, &NameCache::new(), query(json!(["9606", "abc"]))).await;

        assert!(matches!(
            result,
            Err(ResolveTermsError::InvalidArgument(RequestValidationError::InvalidTaxId { .. }))
        ));
        assert_eq!(source.name_queries(), 0);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let source = source();
        let result = handle(&source, &NameCache::new(), query(json!(["999999999"]))).await;
        assert!(matches!(result, Err(ResolveTermsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_list() {
        let source = source();
        let terms = handle(&source, &NameCache::new(), query(json!([])))
            .await
            .unwrap();

        assert!(terms.is_empty());
        assert_eq!(source.name_queries(), 0);
    }
}
