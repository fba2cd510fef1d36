//! Taxonomy data sources
//!
//! The server never owns the taxonomy itself; it reads an externally maintained
//! NCBI classification through a [`TaxonomySource`]. Each request acquires its
//! own [`TaxonomyHandle`] and releases it by dropping it, so a backend whose
//! connections are bound to one task (SQLite) is never shared across requests.
//!
//! # Backends
//!
//! - [`sqlite::SqliteTaxonomy`]: ETE-compatible `taxa.sqlite`, read through a
//!   `sqlx` connection pool
//! - [`memory::InMemoryTaxonomy`]: immutable index loaded from NCBI taxdump files
//!
//! Backends only implement three primitive lookups. Name translation with merged-ID
//! fallback and topology assembly are provided methods shared by all of them.

pub mod memory;
pub mod sqlite;
pub mod taxdump;
pub mod topology;

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use taxo_common::{TaxId, TaxIdError};
use thiserror::Error;

pub use memory::{InMemoryTaxonomy, TaxonomyIndex};
pub use sqlite::SqliteTaxonomy;
pub use topology::{TopologyNode, TopologyOptions};

/// Errors raised by a taxonomy data source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Taxonomy database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Taxa not found in the taxonomy: {}", format_ids(.0))]
    UnknownTaxa(Vec<TaxId>),

    #[error("Invalid lineage track for taxid {taxid}: '{track}'")]
    InvalidTrack { taxid: TaxId, track: String },

    #[error("Invalid taxid stored in taxonomy: {0}")]
    InvalidStoredId(#[from] TaxIdError),

    #[error("Inconsistent taxonomy data: {0}")]
    Inconsistent(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

fn format_ids(ids: &[TaxId]) -> String {
    ids.iter()
        .map(TaxId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A provider of per-request taxonomy handles
#[async_trait]
pub trait TaxonomySource: Send + Sync {
    /// Short backend name reported by the health endpoint
    fn kind(&self) -> &'static str;

    /// Acquire a handle for the duration of one request
    async fn acquire(&self) -> SourceResult<Box<dyn TaxonomyHandle>>;
}

/// A handle onto the taxonomy, used by exactly one request at a time
#[async_trait]
pub trait TaxonomyHandle: Send {
    /// Scientific names of the given taxa; unknown ids are absent from the result
    async fn scientific_names(&mut self, ids: &[TaxId]) -> SourceResult<HashMap<TaxId, String>>;

    /// Obsolete id -> current id, for the given ids that were merged
    async fn merged_targets(&mut self, ids: &[TaxId]) -> SourceResult<HashMap<TaxId, TaxId>>;

    /// Root-first lineage of each known taxon, ending with the taxon itself
    async fn lineages(&mut self, ids: &[TaxId]) -> SourceResult<HashMap<TaxId, Vec<TaxId>>>;

    /// Names of the given taxa, falling back to the merged table
    ///
    /// A merged id is answered with the current taxon's name, keyed by the id
    /// that was asked for.
    async fn translate(&mut self, ids: &[TaxId]) -> SourceResult<HashMap<TaxId, String>> {
        let mut names = self.scientific_names(ids).await?;

        let missing: Vec<TaxId> = ids
            .iter()
            .copied()
            .filter(|id| !names.contains_key(id))
            .collect();
        if missing.is_empty() {
            return Ok(names);
        }

        let merged = self.merged_targets(&missing).await?;
        if merged.is_empty() {
            return Ok(names);
        }

        let current: Vec<TaxId> = merged
            .values()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let current_names = self.scientific_names(&current).await?;
        for (old, new) in merged {
            if let Some(name) = current_names.get(&new) {
                names.insert(old, name.clone());
            }
        }

        Ok(names)
    }

    /// Minimal tree connecting the given taxa
    ///
    /// Merged ids are replaced by their current id. Fails with
    /// [`SourceError::UnknownTaxa`] listing every id the taxonomy does not know.
    async fn topology(
        &mut self,
        ids: &[TaxId],
        options: TopologyOptions,
    ) -> SourceResult<TopologyNode> {
        let merged = self.merged_targets(ids).await?;
        let current: Vec<TaxId> = ids
            .iter()
            .map(|id| merged.get(id).copied().unwrap_or(*id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let lineages = self.lineages(&current).await?;
        if lineages.len() < current.len() {
            let unknown: Vec<TaxId> = current
                .into_iter()
                .filter(|id| !lineages.contains_key(id))
                .collect();
            tracing::debug!(unknown = unknown.len(), "Taxa unknown to the taxonomy");
            return Err(SourceError::UnknownTaxa(unknown));
        }

        topology::assemble(&lineages, options)
    }
}
