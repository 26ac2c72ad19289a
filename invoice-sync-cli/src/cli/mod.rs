//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use commands::extract::ExtractCommands;
use commands::publish::PublishCommands;
use commands::sync::SyncCommands;

#[derive(Parser, Debug)]
#[command(name = "invoice-sync-cli")]
#[command(about = "Clean invoice spreadsheets and sync new invoices to a Google Sheet")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Error log file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert the source spreadsheet into a CSV of invoices not yet processed
    Extract(ExtractCommands),
    /// Append CSV rows whose invoice is not yet on the remote sheet
    Publish(PublishCommands),
    /// Run extract, then publish
    Sync(SyncCommands),
}

/// Dispatch a parsed command
pub async fn run(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Extract(args) => commands::extract::handle_extract_command(args, config),
        Commands::Publish(args) => commands::publish::handle_publish_command(args, config).await,
        Commands::Sync(args) => commands::sync::handle_sync_command(args, config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract_overrides() {
        let cli = Cli::try_parse_from([
            "invoice-sync-cli",
            "extract",
            "--source",
            "march.xlsx",
            "-o",
            "march.csv",
            "--id-column",
            "Invoice",
        ])
        .unwrap();

        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.source_file, PathBuf::from("march.xlsx"));
        assert_eq!(config.csv_file, PathBuf::from("march.csv"));
        assert_eq!(config.id_column, "Invoice");
        assert_eq!(config.processed_ledger, Config::default().processed_ledger);
    }

    #[test]
    fn test_parse_publish_with_global_flags() {
        let cli = Cli::try_parse_from([
            "invoice-sync-cli",
            "publish",
            "--sheet",
            "Invoices",
            "--yes",
            "--no-color",
            "--log-file",
            "logs/errors.log",
        ])
        .unwrap();

        assert!(cli.no_color);
        assert_eq!(cli.log_file, Some(PathBuf::from("logs/errors.log")));
        let Commands::Publish(args) = cli.command else {
            panic!("expected publish");
        };
        assert!(args.yes);

        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.sheet_name, "Invoices");
        assert_eq!(config.keyfile, Config::default().keyfile);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["invoice-sync-cli"]).is_err());
    }
}
