//! Process-wide taxon name cache
//!
//! Scientific names never change while the process runs, so resolved names are
//! kept forever: no eviction, no TTL, no size bound. The key space is bounded
//! by the size of the classification.
//!
//! A batch is answered from the cache where possible and the remaining ids are
//! fetched with a single data-source call. Two requests missing the same id at
//! the same time may both fetch it; the second insert overwrites the first
//! with the same value.

use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};
use taxo_common::TaxId;
use thiserror::Error;

use crate::taxonomy::{SourceError, TaxonomyHandle};

#[derive(Debug, Error)]
pub enum LookupError {
    /// The data source has no name for some of the uncached ids
    #[error("No name found for taxa: {0:?}")]
    NotFound(Vec<TaxId>),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Concurrent id -> scientific name map shared by every request
#[derive(Debug, Default)]
pub struct NameCache {
    names: DashMap<TaxId, String>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the names of `ids`, fetching uncached ones through `handle`
    ///
    /// The batch is all-or-nothing: if any uncached id has no name, the call
    /// fails with [`LookupError::NotFound`] listing those ids and nothing it
    /// fetched is cached. Merged ids count as resolved since `translate` keys
    /// them by the requested id.
    pub async fn lookup(
        &self,
        handle: &mut dyn TaxonomyHandle,
        ids: &[TaxId],
    ) -> Result<BTreeMap<TaxId, String>, LookupError> {
        let requested: BTreeSet<TaxId> = ids.iter().copied().collect();

        let mut resolved = BTreeMap::new();
        let mut uncached = Vec::new();
        for id in requested {
            match self.names.get(&id) {
                Some(name) => {
                    resolved.insert(id, name.value().clone());
                },
                None => uncached.push(id),
            }
        }

        if uncached.is_empty() {
            tracing::trace!(hits = resolved.len(), "Names served from cache");
            return Ok(resolved);
        }

        let fetched = handle.translate(&uncached).await?;
        let missing: Vec<TaxId> = uncached
            .into_iter()
            .filter(|id| !fetched.contains_key(id))
            .collect();
        if !missing.is_empty() {
            tracing::debug!(missing = missing.len(), "Taxa without a name");
            return Err(LookupError::NotFound(missing));
        }

        tracing::debug!(
            hits = resolved.len(),
            fetched = fetched.len(),
            "Fetched uncached names"
        );

        for (id, name) in fetched {
            self.names.insert(id, name.clone());
            resolved.insert(id, name);
        }

        Ok(resolved)
    }

    /// Cached name of a single taxon
    pub fn get(&self, id: TaxId) -> Option<String> {
        self.names.get(&id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
