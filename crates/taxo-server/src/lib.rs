//! Taxonomy Server Library
//!
//! HTTP service translating NCBI taxonomic identifiers into scientific names
//! and into the lineage tree that connects a set of taxa.
//!
//! # Overview
//!
//! - **API Endpoints**: `POST /term`, `POST /tree` and `GET /health`
//! - **Data Sources**: ETE-compatible SQLite database or NCBI taxdump files
//! - **Name Cache**: process-wide, concurrent, never evicted
//! - **Configuration**: `.env`, `TAXO_*` environment variables and CLI flags
//! - **Middleware**: CORS, request tracing and panic recovery
//!
//! # Architecture
//!
//! Each endpoint is a feature slice (`features::terms`, `features::tree`) with
//! its own query and routes. Queries validate their input before touching
//! the data source, acquire one [`taxonomy::TaxonomyHandle`] per request and
//! resolve names through the shared [`cache::NameCache`].
//!
//! # Example
//!
//! ```no_run
//! use taxo_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!     api::serve(config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod middleware;
pub mod taxonomy;

// Re-export commonly used types
pub use cache::NameCache;
pub use error::ApiError;
pub use features::FeatureState;
