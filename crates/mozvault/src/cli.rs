//! CLI argument parsing with clap

use clap::{Parser, Subcommand};

// Re-export command types for convenience
pub use crate::commands::backup::BackupArgs;
pub use crate::commands::list::ListArgs;
pub use crate::commands::restore::RestoreArgs;

/// mozvault - Backup and restore Mozilla-family application profiles
#[derive(Parser, Debug)]
#[command(name = "mozvault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the profiles tracked by an application's registry
    List(ListArgs),

    /// Back up one profile into an archive
    Backup(BackupArgs),

    /// Restore an archive into a profile
    Restore(RestoreArgs),
}
