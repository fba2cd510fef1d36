//! Command-line arguments
//!
//! Flags override values loaded from the environment.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taxo-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// ETE taxa.sqlite database to serve
    #[arg(long, value_name = "FILE", conflicts_with = "taxdump")]
    pub database: Option<PathBuf>,

    /// NCBI taxdump directory (nodes.dmp, names.dmp, merged.dmp) to load in memory
    #[arg(long, value_name = "DIR")]
    pub taxdump: Option<PathBuf>,

    /// Maximum pooled database connections
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags() {
        let cli = Cli::try_parse_from(["taxo-server"]).unwrap();
        assert!(cli.port.is_none());
        assert!(cli.database.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_short_port_flag() {
        let cli = Cli::try_parse_from(["taxo-server", "-p", "3000"]).unwrap();
        assert_eq!(cli.port, Some(3000));
    }

    #[test]
    fn test_database_conflicts_with_taxdump() {
        let result = Cli::try_parse_from([
            "taxo-server",
            "--database",
            "taxa.sqlite",
            "--taxdump",
            "taxdump",
        ]);
        assert!(result.is_err());
    }
}
