//! Taxonomy Server - Main entry point

use anyhow::Result;
use clap::Parser;
use taxo_common::logging::{init_logging, LogConfig, LogLevel};
use tracing::info;

use taxo_server::{api, cli::Cli, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(level)
        .log_file_prefix("taxo-server")
        .filter_directives("taxo_server=debug,tower_http=debug,sqlx=warn")
        .build();

    // Environment variables take precedence
    let log_config = LogConfig::from_env_or(log_config)?;
    init_logging(&log_config)?;

    info!("Starting taxonomy server");

    let mut config = Config::load()?;
    config.apply_cli(&cli);
    config.validate()?;

    info!(
        source = %config.source.kind,
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    api::serve(config).await
}
