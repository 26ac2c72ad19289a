//! Extract command handler

use anyhow::{Context, Result};
use colored::*;

use super::ExtractCommands;
use crate::config::Config;
use crate::extract::{CleanStats, ExtractOutcome, Extractor};

/// Handle the extract command
pub fn handle_extract_command(args: ExtractCommands, mut config: Config) -> Result<()> {
    args.apply(&mut config);
    run_extract(&config)?;
    Ok(())
}

/// Run the extractor and report to the console
pub fn run_extract(config: &Config) -> Result<ExtractOutcome> {
    println!(
        "Reading invoices from {}",
        config.source_file.display().to_string().cyan()
    );

    let outcome = Extractor::new(config)
        .run()
        .with_context(|| format!("Failed to extract invoices from {}", config.source_file.display()))?;

    match &outcome {
        ExtractOutcome::NothingToDo(stats) => {
            print_stats(stats);
            println!("{}", "No new invoices to process.".green());
        }
        ExtractOutcome::Written(summary) => {
            print_stats(&summary.stats);
            println!(
                "{} new invoices saved to {}",
                summary.new_records.to_string().bright_green().bold(),
                config.csv_file.display().to_string().cyan()
            );
            println!(
                "{} invoice numbers recorded in {}",
                summary.processed_ids_appended,
                config.processed_ledger.display()
            );
            if summary.crash_ids_appended > 0 {
                println!(
                    "{} crash entries recorded in {}",
                    summary.crash_ids_appended.to_string().yellow(),
                    config.crash_ledger.display()
                );
            }
            println!(
                "CSV reading completed in {:.2} seconds ({} rows)",
                summary.readback_elapsed.as_secs_f64(),
                summary.readback_rows
            );
        }
    }

    Ok(outcome)
}

fn print_stats(stats: &CleanStats) {
    println!(
        "  {} valid, {} already processed, {} duplicates, {} crash entries, {} empty rows",
        stats.valid,
        stats.already_processed,
        stats.duplicates,
        stats.crash_entries,
        stats.blank_rows + stats.filler_rows
    );
}
