//! Tracing setup for the taxo binaries
//!
//! Logs always go to stderr. Setting a log directory adds a daily rolling file
//! next to it. Environment variables override whatever the binary configured:
//!
//! - `LOG_LEVEL`: trace, debug, info, warn, error
//! - `LOG_FORMAT`: text, json
//! - `LOG_DIR`: directory for the rolling log file
//! - `LOG_FILTER`: extra filter directives, e.g. `sqlx=warn`
//!
//! ```no_run
//! use taxo_common::logging::{init_logging, LogConfig, LogLevel};
//!
//! let config = LogConfig::builder().level(LogLevel::Debug).build();
//! init_logging(&LogConfig::from_env_or(config)?)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::{self, MakeWriter},
    layer::{Layered, SubscriberExt},
    registry::Registry,
    util::SubscriberInitExt,
    Layer,
};

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,

    /// Write a daily rolling file here in addition to stderr
    pub log_dir: Option<PathBuf>,

    /// File name prefix, e.g. "taxo-server" -> "taxo-server.2026-10-19"
    pub log_file_prefix: String,

    /// Extra filter directives, comma separated
    pub filter_directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            log_dir: None,
            log_file_prefix: "taxo".to_string(),
            filter_directives: None,
        }
    }
}

impl LogConfig {
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }

    /// Apply `LOG_*` environment variables on top of `base`
    pub fn from_env_or(base: Self) -> Result<Self> {
        Self::from_vars(base, |key| std::env::var(key).ok())
    }

    fn from_vars(base: Self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = base;

        if let Some(level) = var("LOG_LEVEL") {
            config.level = level.parse()?;
        }
        if let Some(format) = var("LOG_FORMAT") {
            config.format = format.parse()?;
        }
        if let Some(dir) = var("LOG_DIR") {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(filter) = var("LOG_FILTER") {
            config.filter_directives = Some(filter);
        }

        Ok(config)
    }
}

#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn log_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.log_file_prefix = prefix.into();
        self
    }

    pub fn filter_directives(mut self, filter: impl Into<String>) -> Self {
        self.config.filter_directives = Some(filter.into());
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}

/// Install the global subscriber; fails if one is already set
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let mut layers = vec![fmt_layer(config.format, std::io::stderr, true)];

    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir).context("Failed to create log directory")?;
        let appender = tracing_appender::rolling::daily(dir, &config.log_file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        // flushes on drop, the subscriber lives until exit
        std::mem::forget(guard);
        layers.push(fmt_layer(config.format, non_blocking, false));
    }

    tracing_subscriber::registry()
        .with(build_filter(config)?)
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

fn build_filter(config: &LogConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env().add_directive(Level::from(config.level).into());

    let directives = config.filter_directives.as_deref().unwrap_or_default();
    for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        filter = filter.add_directive(
            directive
                .parse()
                .with_context(|| format!("Failed to parse filter directive '{}'", directive))?,
        );
    }

    Ok(filter)
}

fn fmt_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);

    match format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
