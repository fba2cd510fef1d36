//! Feature modules implementing the taxonomy API
//!
//! Each feature is a vertical slice with its own queries and routes.
//!
//! # Features
//!
//! - **terms**: `POST /term`, taxonomic ID to scientific name translation
//! - **tree**: `POST /tree`, lineage tree connecting a set of taxa
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `queries/` - Request validation and the read operation itself
//! - `routes.rs` - HTTP route definitions
//!
//! Both features share the request checks in `shared` and the process-wide
//! [`NameCache`].

pub mod shared;
pub mod terms;
pub mod tree;

use axum::Router;
use std::sync::Arc;

use crate::cache::NameCache;
use crate::taxonomy::TaxonomySource;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Taxonomy backend; each request acquires its own handle from it
    pub source: Arc<dyn TaxonomySource>,
    /// Names resolved so far, shared by every request
    pub cache: Arc<NameCache>,
}

impl FeatureState {
    pub fn new(source: Arc<dyn TaxonomySource>) -> Self {
        Self {
            source,
            cache: Arc::new(NameCache::new()),
        }
    }
}

/// Creates the router with all feature routes mounted at the root
pub fn router() -> Router<FeatureState> {
    Router::new()
        .merge(terms::terms_routes())
        .merge(tree::tree_routes())
}
