//! `extract` command

mod handler;

use std::path::PathBuf;

use clap::Args;

use crate::config::Config;

pub use handler::{handle_extract_command, run_extract};

#[derive(Args, Debug, Default, Clone)]
pub struct ExtractCommands {
    /// Spreadsheet to read
    #[arg(long, short)]
    pub source: Option<PathBuf>,

    /// CSV file to write
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Ledger of processed invoice numbers
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Ledger of malformed (crash) rows
    #[arg(long)]
    pub crash_ledger: Option<PathBuf>,

    /// Name of the invoice number column
    #[arg(long)]
    pub id_column: Option<String>,
}

impl ExtractCommands {
    pub fn apply(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.source_file = source.clone();
        }
        if let Some(output) = &self.output {
            config.csv_file = output.clone();
        }
        if let Some(ledger) = &self.ledger {
            config.processed_ledger = ledger.clone();
        }
        if let Some(crash_ledger) = &self.crash_ledger {
            config.crash_ledger = crash_ledger.clone();
        }
        if let Some(id_column) = &self.id_column {
            config.id_column = id_column.clone();
        }
    }
}
