//! Publish command handler

use anyhow::{Context, Result};
use colored::*;
use dialoguer::Confirm;
use is_terminal::IsTerminal;

use super::PublishCommands;
use crate::config::Config;
use crate::publish::{AlwaysClear, ClearGuard, PublishReport, Publisher, SkipReason};

/// Asks the operator before a populated remote sheet is cleared
pub struct PromptClear;

impl ClearGuard for PromptClear {
    fn confirm_clear(&mut self, sheet: &str, remote: Option<&[String]>, local: &[String]) -> bool {
        println!(
            "{} header on '{}' does not match the local header",
            "Warning:".yellow().bold(),
            sheet
        );
        println!("  remote: {}", remote.map(|h| h.join(", ")).unwrap_or_default().dimmed());
        println!("  local:  {}", local.join(", ").dimmed());

        if !std::io::stdin().is_terminal() {
            println!(
                "{}",
                "Not running interactively; pass --yes to allow clearing the sheet.".yellow()
            );
            return false;
        }

        Confirm::new()
            .with_prompt("Clear the remote sheet? Every existing row will be lost")
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Handle the publish command
pub async fn handle_publish_command(args: PublishCommands, mut config: Config) -> Result<()> {
    args.apply(&mut config);
    run_publish(&config, args.yes).await?;
    Ok(())
}

/// Connect, upload and report to the console
pub async fn run_publish(config: &Config, assume_yes: bool) -> Result<PublishReport> {
    println!("Connecting to Google Sheets...");

    let mut publisher = Publisher::new(config);
    let mut sheet = publisher
        .connect()
        .await
        .with_context(|| format!("Google Sheets connection to '{}' failed", config.sheet_name))?;
    println!("{}", "Successfully connected!".green());

    println!(
        "Uploading {}...",
        config.csv_file.display().to_string().cyan()
    );

    let mut always = AlwaysClear;
    let mut prompt = PromptClear;
    let guard: &mut dyn ClearGuard = if assume_yes { &mut always } else { &mut prompt };
    let report = publisher
        .upload(&mut sheet, guard)
        .await
        .context("Error uploading data")?;
    log::info!("Publisher finished in state {}", publisher.state());

    if report.header_reset {
        println!("{}", "Remote sheet reset to the local header.".yellow());
    }
    if report.already_present > 0 {
        println!(
            "{} records already on the sheet",
            report.already_present.to_string().dimmed()
        );
    }

    match report.skip_reason {
        None => println!(
            "{} new records added!",
            report.appended.to_string().bright_green().bold()
        ),
        Some(SkipReason::NoNewRecords) => println!("{}", "No new records to add.".green()),
        Some(SkipReason::ClearDeclined) => println!(
            "{}",
            "Header mismatch left unresolved; nothing uploaded.".yellow()
        ),
    }

    Ok(report)
}
