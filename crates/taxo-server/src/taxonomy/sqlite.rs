//! SQLite taxonomy backend
//!
//! Reads an ETE-toolkit compatible `taxa.sqlite`:
//!
//! ```sql
//! CREATE TABLE species (taxid INTEGER PRIMARY KEY, parent INTEGER, spname TEXT,
//!                       common TEXT, rank TEXT, track TEXT);
//! CREATE TABLE merged (taxid_old INTEGER, taxid_new INTEGER);
//! ```
//!
//! `track` holds the comma-separated lineage from the taxon up to the root
//! (`"9606,9605,207598,...,1"`).
//!
//! An SQLite connection must stay with the task that uses it, so every handle
//! owns one pooled connection for the lifetime of a request. Dropping the
//! handle returns the connection to the pool on every exit path.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use taxo_common::TaxId;

use super::{SourceError, SourceResult, TaxonomyHandle, TaxonomySource};

/// Maximum number of bound parameters per statement
///
/// Older SQLite builds cap host parameters at 999.
const MAX_BOUND_PARAMETERS: usize = 900;

/// Connection settings for the SQLite backend
#[derive(Debug, Clone)]
pub struct SqliteSourceConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl SqliteSourceConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 8,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// Taxonomy source backed by a pooled, read-only SQLite database
#[derive(Debug, Clone)]
pub struct SqliteTaxonomy {
    pool: SqlitePool,
}

impl SqliteTaxonomy {
    /// Open the database read-only and verify its schema
    pub async fn connect(config: &SqliteSourceConfig) -> SourceResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        tracing::info!(
            path = %config.path.display(),
            max_connections = config.max_connections,
            "Taxonomy database pool created"
        );

        let source = Self::from_pool(pool);
        source.check_schema().await?;
        Ok(source)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fail early when the file is not an ETE taxonomy database
    async fn check_schema(&self) -> SourceResult<()> {
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('species', 'merged')",
        )
        .fetch_all(&self.pool)
        .await?;

        for required in ["species", "merged"] {
            if !tables.iter().any(|t| t == required) {
                return Err(SourceError::Inconsistent(format!(
                    "taxonomy database is missing the '{}' table",
                    required
                )));
            }
        }
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".etetoolkit").join("taxa.sqlite"))
    }
}

#[async_trait]
impl TaxonomySource for SqliteTaxonomy {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    async fn acquire(&self) -> SourceResult<Box<dyn TaxonomyHandle>> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(SqliteHandle { conn }))
    }
}

struct SqliteHandle {
    conn: PoolConnection<Sqlite>,
}

impl SqliteHandle {
    /// Run `SELECT <columns> FROM <table> WHERE <key> IN (...)` in chunks
    async fn select_in<T>(
        &mut self,
        columns: &str,
        table: &str,
        key: &str,
        ids: &[TaxId],
    ) -> SourceResult<Vec<T>>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
    {
        let mut rows = Vec::new();

        for chunk in ids.chunks(MAX_BOUND_PARAMETERS) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new(format!("SELECT {} FROM {} WHERE {} IN (", columns, table, key));
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id.as_i64());
            }
            separated.push_unseparated(")");

            let mut fetched = builder
                .build_query_as::<T>()
                .fetch_all(&mut *self.conn)
                .await?;
            rows.append(&mut fetched);
        }

        Ok(rows)
    }
}

#[async_trait]
impl TaxonomyHandle for SqliteHandle {
    async fn scientific_names(&mut self, ids: &[TaxId]) -> SourceResult<HashMap<TaxId, String>> {
        let rows: Vec<(i64, String)> = self
            .select_in("taxid, spname", "species", "taxid", ids)
            .await?;

        rows.into_iter()
            .map(|(taxid, name)| -> SourceResult<(TaxId, String)> {
                Ok((TaxId::try_from(taxid)?, name))
            })
            .collect()
    }

    async fn merged_targets(&mut self, ids: &[TaxId]) -> SourceResult<HashMap<TaxId, TaxId>> {
        let rows: Vec<(i64, i64)> = self
            .select_in("taxid_old, taxid_new", "merged", "taxid_old", ids)
            .await?;

        rows.into_iter()
            .map(|(old, new)| -> SourceResult<(TaxId, TaxId)> {
                Ok((TaxId::try_from(old)?, TaxId::try_from(new)?))
            })
            .collect()
    }

    async fn lineages(&mut self, ids: &[TaxId]) -> SourceResult<HashMap<TaxId, Vec<TaxId>>> {
        let rows: Vec<(i64, String)> = self
            .select_in("taxid, track", "species", "taxid", ids)
            .await?;

        let mut lineages = HashMap::with_capacity(rows.len());
        for (taxid, track) in rows {
            let taxid = TaxId::try_from(taxid)?;
            lineages.insert(taxid, parse_track(taxid, &track)?);
        }
        Ok(lineages)
    }
}

/// Parse a leaf-first `track` column into a root-first lineage
fn parse_track(taxid: TaxId, track: &str) -> SourceResult<Vec<TaxId>> {
    let mut lineage = track
        .split(',')
        .map(|part| part.parse::<TaxId>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| SourceError::InvalidTrack {
            taxid,
            track: track.to_string(),
        })?;

    lineage.reverse();
    Ok(lineage)
}
