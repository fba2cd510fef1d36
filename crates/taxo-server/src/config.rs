//! Configuration management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cli::Cli;
use crate::taxonomy::sqlite::SqliteSourceConfig;
use crate::taxonomy::SqliteTaxonomy;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 3278;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Database file used when no home directory can be determined.
pub const DEFAULT_DATABASE_FILE: &str = "taxa.sqlite";

/// Default maximum database connections in the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// Default pool acquire timeout in seconds.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Default CORS allowed origin (any).
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Which taxonomy backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Sqlite,
    Taxdump,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Sqlite => write!(f, "sqlite"),
            SourceKind::Taxdump => write!(f, "taxdump"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(SourceKind::Sqlite),
            "taxdump" => Ok(SourceKind::Taxdump),
            other => anyhow::bail!("Unknown taxonomy source '{}', expected sqlite or taxdump", other),
        }
    }
}

/// Taxonomy source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// ETE `taxa.sqlite` database, used by the sqlite backend
    pub database_path: PathBuf,
    /// NCBI taxdump directory, used by the taxdump backend
    pub taxdump_dir: Option<PathBuf>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl SourceConfig {
    pub fn sqlite(&self) -> SqliteSourceConfig {
        SqliteSourceConfig {
            path: self.database_path.clone(),
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup, falling back to defaults
    ///
    /// Variables: `TAXO_HOST`, `TAXO_PORT`, `TAXO_SHUTDOWN_TIMEOUT`, `TAXO_SOURCE`,
    /// `TAXO_DATABASE`, `TAXO_TAXDUMP_DIR`, `TAXO_MAX_CONNECTIONS`,
    /// `TAXO_ACQUIRE_TIMEOUT`, `TAXO_CORS_ALLOWED_ORIGINS`,
    /// `TAXO_CORS_ALLOW_CREDENTIALS`.
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let taxdump_dir = var("TAXO_TAXDUMP_DIR").map(PathBuf::from);
        let kind = match var("TAXO_SOURCE") {
            Some(kind) => kind.parse()?,
            None if taxdump_dir.is_some() => SourceKind::Taxdump,
            None => SourceKind::Sqlite,
        };

        let config = Config {
            server: ServerConfig {
                host: var("TAXO_HOST").unwrap_or(defaults.server.host),
                port: parse_or(&var, "TAXO_PORT", defaults.server.port),
                shutdown_timeout_secs: parse_or(
                    &var,
                    "TAXO_SHUTDOWN_TIMEOUT",
                    defaults.server.shutdown_timeout_secs,
                ),
            },
            source: SourceConfig {
                kind,
                database_path: var("TAXO_DATABASE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.source.database_path),
                taxdump_dir,
                max_connections: parse_or(
                    &var,
                    "TAXO_MAX_CONNECTIONS",
                    defaults.source.max_connections,
                ),
                acquire_timeout_secs: parse_or(
                    &var,
                    "TAXO_ACQUIRE_TIMEOUT",
                    defaults.source.acquire_timeout_secs,
                ),
            },
            cors: CorsConfig {
                allowed_origins: var("TAXO_CORS_ALLOWED_ORIGINS")
                    .map(|origins| {
                        origins
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or(defaults.cors.allowed_origins),
                allow_credentials: parse_or(
                    &var,
                    "TAXO_CORS_ALLOW_CREDENTIALS",
                    defaults.cors.allow_credentials,
                ),
            },
        };

        Ok(config)
    }

    /// Override loaded values with command-line flags
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(path) = &cli.database {
            self.source.kind = SourceKind::Sqlite;
            self.source.database_path = path.clone();
        }
        if let Some(dir) = &cli.taxdump {
            self.source.kind = SourceKind::Taxdump;
            self.source.taxdump_dir = Some(dir.clone());
        }
        if let Some(max) = cli.max_connections {
            self.source.max_connections = max;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        match self.source.kind {
            SourceKind::Sqlite => {
                if self.source.database_path.as_os_str().is_empty() {
                    anyhow::bail!("Taxonomy database path cannot be empty");
                }
                if self.source.max_connections == 0 {
                    anyhow::bail!("Taxonomy database max_connections must be greater than 0");
                }
            },
            SourceKind::Taxdump => match &self.source.taxdump_dir {
                Some(dir) if !dir.as_os_str().is_empty() => {},
                _ => anyhow::bail!("Taxdump source selected but no taxdump directory configured"),
            },
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable configuration value");
            default
        }),
        None => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            source: SourceConfig {
                kind: SourceKind::Sqlite,
                database_path: SqliteTaxonomy::default_path()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE)),
                taxdump_dir: None,
                max_connections: DEFAULT_MAX_CONNECTIONS,
                acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: false,
            },
        }
    }
}
