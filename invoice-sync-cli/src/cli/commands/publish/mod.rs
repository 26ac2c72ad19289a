//! `publish` command

mod handler;

use std::path::PathBuf;

use clap::Args;

use crate::config::Config;

pub use handler::{handle_publish_command, run_publish};

#[derive(Args, Debug, Default, Clone)]
pub struct PublishCommands {
    /// CSV file to upload
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Name of the remote spreadsheet
    #[arg(long)]
    pub sheet: Option<String>,

    /// Service-account key file
    #[arg(long)]
    pub keyfile: Option<PathBuf>,

    /// Name of the invoice number column
    #[arg(long)]
    pub id_column: Option<String>,

    /// Clear the remote sheet on header mismatch without asking
    #[arg(long, short)]
    pub yes: bool,
}

impl PublishCommands {
    pub fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.csv_file = input.clone();
        }
        if let Some(sheet) = &self.sheet {
            config.sheet_name = sheet.clone();
        }
        if let Some(keyfile) = &self.keyfile {
            config.keyfile = keyfile.clone();
        }
        if let Some(id_column) = &self.id_column {
            config.id_column = id_column.clone();
        }
    }
}
