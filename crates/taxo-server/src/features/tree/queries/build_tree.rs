use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use taxo_common::TaxId;

use crate::cache::{LookupError, NameCache};
use crate::features::shared::{parse_taxids, required_field, RequestValidationError};
use crate::taxonomy::{
    SourceError, TaxonomyHandle, TaxonomySource, TopologyNode, TopologyOptions,
};

pub const TAXIDS_FIELD: &str = "taxids";
pub const INTERMEDIATE_NODES_FIELD: &str = "intermediate_nodes";
pub const TAXIDS_TYPE_REASON: &str = "Taxonomic IDs must be sended as a string array";
pub const INTERMEDIATE_NODES_TYPE_REASON: &str = "intermediate_nodes must be a boolean";

/// A named node of the lineage tree
///
/// Serializes as `{"name": ..., "children": {<id>: <node>, ...}}`; the node's
/// own id is the key under which its parent lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomicNode {
    #[serde(skip)]
    pub id: TaxId,
    pub name: String,
    pub children: BTreeMap<TaxId, TaxonomicNode>,
}

impl TaxonomicNode {
    /// Nodes in this subtree
    pub fn len(&self) -> usize {
        1 + self.children.values().map(TaxonomicNode::len).sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildTreeQuery {
    pub taxids: Vec<Value>,
    pub intermediate_nodes: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildTreeError {
    #[error(transparent)]
    InvalidArgument(#[from] RequestValidationError),

    #[error("At least one taxonomic ID is required")]
    NoTaxIds,

    #[error("Term not found")]
    NotFound(Vec<TaxId>),

    #[error("No name found for taxa in the tree: {0:?}")]
    UnnamedTaxa(Vec<TaxId>),

    #[error("Taxonomy source error: {0}")]
    Source(SourceError),
}

impl From<SourceError> for BuildTreeError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::UnknownTaxa(ids) => Self::NotFound(ids),
            other => Self::Source(other),
        }
    }
}

impl From<LookupError> for BuildTreeError {
    fn from(err: LookupError) -> Self {
        match err {
            // every node of an assembled topology exists in the taxonomy
            LookupError::NotFound(ids) => Self::UnnamedTaxa(ids),
            LookupError::Source(e) => Self::Source(e),
        }
    }
}

impl BuildTreeQuery {
    /// Read `taxids` and the optional `intermediate_nodes` flag from a body
    pub fn from_json(body: &Value) -> Result<Self, RequestValidationError> {
        let taxids = match required_field(body, TAXIDS_FIELD)? {
            Value::Array(items) => items.clone(),
            _ => {
                return Err(RequestValidationError::WrongType {
                    field: TAXIDS_FIELD,
                    reason: TAXIDS_TYPE_REASON,
                })
            },
        };

        let intermediate_nodes = match body.get(INTERMEDIATE_NODES_FIELD) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => {
                return Err(RequestValidationError::WrongType {
                    field: INTERMEDIATE_NODES_FIELD,
                    reason: INTERMEDIATE_NODES_TYPE_REASON,
                })
            },
        };

        Ok(Self {
            taxids,
            intermediate_nodes,
        })
    }

    pub fn validate(&self) -> Result<Vec<TaxId>, BuildTreeError> {
        let ids = parse_taxids(&self.taxids)?;
        if ids.is_empty() {
            return Err(BuildTreeError::NoTaxIds);
        }
        Ok(ids)
    }
}

/// Build the named lineage tree connecting the requested taxa
///
/// Names are resolved one tree level at a time through the shared cache, so
/// each level costs at most one data-source call. The result holds a single
/// entry: the root of the tree keyed by its id.
pub async fn handle(
    source: &dyn TaxonomySource,
    cache: &NameCache,
    query: BuildTreeQuery,
) -> Result<BTreeMap<TaxId, TaxonomicNode>, BuildTreeError> {
    let ids = query.validate()?;
    let options = TopologyOptions {
        intermediate_nodes: query.intermediate_nodes,
    };

    let mut handle = source.acquire().await?;
    let topology = handle.topology(&ids, options).await?;

    tracing::debug!(
        requested = ids.len(),
        nodes = topology.len(),
        root = %topology.id,
        "Assembled lineage topology"
    );

    let names = resolve_names(cache, handle.as_mut(), &topology).await?;
    let root = name_tree(&topology, &names)?;

    Ok(BTreeMap::from([(root.id, root)]))
}

async fn resolve_names(
    cache: &NameCache,
    handle: &mut dyn TaxonomyHandle,
    root: &TopologyNode,
) -> Result<BTreeMap<TaxId, String>, BuildTreeError> {
    let mut names = BTreeMap::new();
    let mut level = vec![root];

    while !level.is_empty() {
        let ids: Vec<TaxId> = level.iter().map(|node| node.id).collect();
        names.extend(cache.lookup(handle, &ids).await?);
        level = level
            .iter()
            .flat_map(|node| node.children.iter())
            .collect();
    }

    Ok(names)
}

fn name_tree(
    node: &TopologyNode,
    names: &BTreeMap<TaxId, String>,
) -> Result<TaxonomicNode, BuildTreeError> {
    let name = names
        .get(&node.id)
        .cloned()
        .ok_or_else(|| BuildTreeError::UnnamedTaxa(vec![node.id]))?;

    let children = node
        .children
        .iter()
        .map(|child| Ok((child.id, name_tree(child, names)?)))
        .collect::<Result<BTreeMap<_, _>, BuildTreeError>>()?;

    Ok(TaxonomicNode {
        id: node.id,
        name,
        children,
    })
}
