//! In-memory taxonomy backend
//!
//! Holds the parent links, scientific names and merged ids of a classification
//! in an immutable [`TaxonomyIndex`]. Handles are cheap clones of an `Arc`, so
//! any number of requests can read concurrently.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taxo_common::TaxId;

use super::{taxdump, SourceError, SourceResult, TaxonomyHandle, TaxonomySource};

/// Parent links, names and merged ids of a taxonomy
#[derive(Debug, Clone, Default)]
pub struct TaxonomyIndex {
    parents: HashMap<TaxId, TaxId>,
    names: HashMap<TaxId, String>,
    merged: HashMap<TaxId, TaxId>,
}

impl TaxonomyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a taxon; the root is its own parent
    pub fn insert_taxon(&mut self, id: TaxId, parent: TaxId, name: impl Into<String>) {
        self.parents.insert(id, parent);
        self.names.insert(id, name.into());
    }

    pub fn insert_parent(&mut self, id: TaxId, parent: TaxId) {
        self.parents.insert(id, parent);
    }

    pub fn insert_name(&mut self, id: TaxId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    /// Record that `old` was merged into `new`
    pub fn insert_merged(&mut self, old: TaxId, new: TaxId) {
        self.merged.insert(old, new);
    }

    pub fn name(&self, id: TaxId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn merged_into(&self, id: TaxId) -> Option<TaxId> {
        self.merged.get(&id).copied()
    }

    /// Number of taxa with a parent link
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Root-first lineage of `id`, or `None` when the taxon is unknown
    pub fn lineage(&self, id: TaxId) -> SourceResult<Option<Vec<TaxId>>> {
        if !self.parents.contains_key(&id) {
            return Ok(None);
        }

        let mut lineage = vec![id];
        let mut current = id;
        while let Some(&parent) = self.parents.get(&current) {
            if parent == current {
                break;
            }
            if lineage.len() > self.parents.len() {
                return Err(SourceError::Inconsistent(format!(
                    "parent links of taxid {} form a cycle",
                    id
                )));
            }
            lineage.push(parent);
            current = parent;
        }

        lineage.reverse();
        Ok(Some(lineage))
    }
}

/// Taxonomy source serving an in-memory index
#[derive(Debug, Clone)]
pub struct InMemoryTaxonomy {
    index: Arc<TaxonomyIndex>,
    name_queries: Arc<AtomicUsize>,
}

impl InMemoryTaxonomy {
    pub fn new(index: TaxonomyIndex) -> Self {
        Self {
            index: Arc::new(index),
            name_queries: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Load an NCBI taxdump directory (`nodes.dmp`, `names.dmp`, optional `merged.dmp`)
    pub fn from_taxdump(dir: &Path) -> taxo_common::Result<Self> {
        let index = taxdump::load_index(dir)?;
        Ok(Self::new(index))
    }

    pub fn index(&self) -> &TaxonomyIndex {
        &self.index
    }

    /// Number of name lookups served so far, across all handles
    pub fn name_queries(&self) -> usize {
        self.name_queries.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TaxonomySource for InMemoryTaxonomy {
    fn kind(&self) -> &'static str {
        "taxdump"
    }

    async fn acquire(&self) -> SourceResult<Box<dyn TaxonomyHandle>> {
        Ok(Box::new(MemoryHandle {
            index: Arc::clone(&self.index),
            name_queries: Arc::clone(&self.name_queries),
        }))
    }
}

struct MemoryHandle {
    index: Arc<TaxonomyIndex>,
    name_queries: Arc<AtomicUsize>,
}

#[async_trait]
impl TaxonomyHandle for MemoryHandle {
    async fn scientific_names(&mut self, ids: &[TaxId]) -> SourceResult<HashMap<TaxId, String>> {
        self.name_queries.fetch_add(1, Ordering::Relaxed);
        Ok(ids
            .iter()
            .filter_map(|id| self.index.name(*id).map(|name| (*id, name.to_string())))
            .collect())
    }

    async fn merged_targets(&mut self, ids: &[TaxId]) -> SourceResult<HashMap<TaxId, TaxId>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.index.merged_into(*id).map(|new| (*id, new)))
            .collect())
    }

    async fn lineages(&mut self, ids: &[TaxId]) -> SourceResult<HashMap<TaxId, Vec<TaxId>>> {
        let mut lineages = HashMap::with_capacity(ids.len());
        for &id in ids {
            if let Some(lineage) = self.index.lineage(id)? {
                lineages.insert(id, lineage);
            }
        }
        Ok(lineages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::TopologyOptions;

    fn id(value: u32) -> TaxId {
        TaxId::new(value).unwrap()
    }

    fn index() -> TaxonomyIndex {
        let mut index = TaxonomyIndex::new();
        index.insert_taxon(id(1), id(1), "root");
        index.insert_taxon(id(9604), id(1), "Hominidae");
        index.insert_taxon(id(9605), id(9604), "Homo");
        index.insert_taxon(id(9606), id(9605), "Homo sapiens");
        index.insert_taxon(id(9596), id(9604), "Pan");
        index.insert_taxon(id(9598), id(9596), "Pan troglodytes");
        index.insert_merged(id(1425170), id(9606));
        index
    }

    #[test]
    fn test_lineage_walks_to_root() {
        let lineage = index().lineage(id(9606)).unwrap().unwrap();
        assert_eq!(lineage, vec![id(1), id(9604), id(9605), id(9606)]);
        assert_eq!(index().lineage(id(42)).unwrap(), None);
    }

    #[test]
    fn test_lineage_detects_cycles() {
        let mut index = TaxonomyIndex::new();
        index.insert_parent(id(10), id(11));
        index.insert_parent(id(11), id(10));
        assert!(index.lineage(id(10)).is_err());
    }

    #[tokio::test]
    async fn test_translate_falls_back_to_merged() {
        let source = InMemoryTaxonomy::new(index());
        let mut handle = source.acquire().await.unwrap();

        let names = handle.translate(&[id(9598), id(1425170), id(42)]).await.unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[&id(9598)], "Pan troglodytes");
        assert_eq!(names[&id(1425170)], "Homo sapiens");
    }

    #[tokio::test]
    async fn test_name_queries_are_counted() {
        let source = InMemoryTaxonomy::new(index());
        let mut handle = source.acquire().await.unwrap();

        handle.translate(&[id(9606)]).await.unwrap();
        assert_eq!(source.name_queries(), 1);
    }

    #[tokio::test]
    async fn test_topology_translates_merged() {
        let source = InMemoryTaxonomy::new(index());
        let mut handle = source.acquire().await.unwrap();

        let tree = handle
            .topology(&[id(1425170), id(9598)], TopologyOptions::default())
            .await
            .unwrap();
        assert_eq!(tree.id, id(9604));
        assert_eq!(tree.ids(), [9604, 9606, 9598].iter().map(|v| id(*v)).collect());
    }

    #[tokio::test]
    async fn test_topology_with_one_unknown_taxon_fails() {
        let source = InMemoryTaxonomy::new(index());
        let mut handle = source.acquire().await.unwrap();

        let result = handle
            .topology(&[id(1425170), id(9598), id(424242)], TopologyOptions::default())
            .await;
        assert!(matches!(result, Err(SourceError::UnknownTaxa(ids)) if ids == vec![id(424242)]));
    }

    #[tokio::test]
    async fn test_topology_of_unknown_taxa_fails() {
        let source = InMemoryTaxonomy::new(index());
        let mut handle = source.acquire().await.unwrap();

        let result = handle.topology(&[id(424242)], TopologyOptions::default()).await;
        assert!(matches!(result, Err(SourceError::UnknownTaxa(_))));
    }
}
