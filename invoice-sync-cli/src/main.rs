mod api;
mod cli;
mod config;
mod error;
mod extract;
mod ledger;
mod logging;
mod publish;
mod records;

use std::process::ExitCode;

use clap::Parser;
use colored::*;

use cli::Cli;
use config::Config;
use error::SyncError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let loaded = Config::load(cli.config.as_deref());

    let log_file = cli.log_file.clone().unwrap_or_else(|| match &loaded {
        Ok(config) => config.log_file.clone(),
        Err(_) => Config::default().log_file,
    });
    if let Err(e) = logging::init_logging(&log_file) {
        eprintln!("{} {:#}", "Warning:".yellow().bold(), e);
    }

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            report_failure(&e);
            return ExitCode::FAILURE;
        }
    };
    config.log_file = log_file;

    match cli::run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e);
            ExitCode::FAILURE
        }
    }
}

/// Log an error and show it to the operator
fn report_failure(err: &anyhow::Error) {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<SyncError>())
        .map(SyncError::kind)
        .unwrap_or("Error");

    log::error!("[{}] {:#}", kind, err);
    eprintln!("{} {:#}", format!("{}:", kind).red().bold(), err);
}
