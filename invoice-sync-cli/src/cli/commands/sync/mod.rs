//! `sync` command: extract then publish

mod handler;

use clap::Args;

pub use handler::handle_sync_command;

#[derive(Args, Debug, Default, Clone)]
pub struct SyncCommands {
    /// Clear the remote sheet on header mismatch without asking
    #[arg(long, short)]
    pub yes: bool,
}
