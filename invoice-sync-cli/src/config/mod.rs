//! Runtime configuration
//!
//! Values are layered, later layers winning:
//! defaults -> TOML file -> environment (including `.env`) -> CLI flags.
//! The resulting [`Config`] is handed explicitly to the extractor and the
//! publisher; nothing reads process-wide state after startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CONFIG_DIR_NAME: &str = "invoice-sync";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable holding the service-account key path
pub const KEYFILE_ENV: &str = "GOOGLE_SHEET_KEYFILE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spreadsheet the extractor reads
    pub source_file: PathBuf,
    /// Comma-separated file written by extract and read by publish
    pub csv_file: PathBuf,
    /// Ledger of identifiers already exported
    pub processed_ledger: PathBuf,
    /// Ledger of identifiers seen on malformed rows
    pub crash_ledger: PathBuf,
    /// Name of the identifier column
    pub id_column: String,
    /// Remote spreadsheet to publish into, looked up by name
    pub sheet_name: String,
    /// Service-account key file for the remote service
    pub keyfile: PathBuf,
    /// Error log destination
    pub log_file: PathBuf,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_file: PathBuf::from("customer.xlsx"),
            csv_file: PathBuf::from("customer.csv"),
            processed_ledger: PathBuf::from("processed_invoices.txt"),
            crash_ledger: PathBuf::from("crash_entries.txt"),
            id_column: "InvoiceNo".to_string(),
            sheet_name: "Data-automte-ex-sheet".to_string(),
            keyfile: PathBuf::from("service_account.json"),
            log_file: PathBuf::from("process.log"),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, the platform config file is
    /// used when present and skipped otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// `<config dir>/invoice-sync/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Override fields from environment variables resolved through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("INVOICE_SYNC_SOURCE_FILE") {
            self.source_file = v.into();
        }
        if let Some(v) = var("INVOICE_SYNC_CSV_FILE") {
            self.csv_file = v.into();
        }
        if let Some(v) = var("INVOICE_SYNC_PROCESSED_LEDGER") {
            self.processed_ledger = v.into();
        }
        if let Some(v) = var("INVOICE_SYNC_CRASH_LEDGER") {
            self.crash_ledger = v.into();
        }
        if let Some(v) = var("INVOICE_SYNC_ID_COLUMN") {
            self.id_column = v;
        }
        if let Some(v) = var("INVOICE_SYNC_SHEET_NAME") {
            self.sheet_name = v;
        }
        if let Some(v) = var(KEYFILE_ENV) {
            self.keyfile = v.into();
        }
        if let Some(v) = var("INVOICE_SYNC_LOG_FILE") {
            self.log_file = v.into();
        }
        if let Some(v) = var("INVOICE_SYNC_TIMEOUT_SECS") {
            match v.trim().parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => log::warn!("Ignoring invalid INVOICE_SYNC_TIMEOUT_SECS: {}", v),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
