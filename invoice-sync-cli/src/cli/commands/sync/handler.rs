//! Sync command handler

use anyhow::Result;
use colored::*;

use super::SyncCommands;
use crate::cli::commands::extract::run_extract;
use crate::cli::commands::publish::run_publish;
use crate::config::Config;
use crate::extract::ExtractOutcome;

/// Extract, then publish whatever CSV is on disk
///
/// A failed extraction stops the run before anything is uploaded.
pub async fn handle_sync_command(args: SyncCommands, config: Config) -> Result<()> {
    let outcome = run_extract(&config)?;

    if matches!(outcome, ExtractOutcome::NothingToDo(_)) && !config.csv_file.exists() {
        println!("{}", "Nothing to publish.".green());
        return Ok(());
    }

    println!();
    run_publish(&config, args.yes).await?;
    Ok(())
}
