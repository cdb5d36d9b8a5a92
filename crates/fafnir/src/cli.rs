//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};

/// Fafnir - resolve secret references from application configuration
#[derive(Parser, Debug)]
#[command(name = "fafnir")]
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
    /// Resolve a configuration entry and print its value
    Resolve(ResolveArgs),

    /// Validate an entry's reference syntax without resolving it
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Configuration entry, e.g. `secret:acme/db-pass`
    pub entry: String,

    /// Print provenance (key, source, identity) to stderr
    #[arg(long)]
    pub provenance: bool,

    /// Abort the vault call after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Configuration entry to classify
    pub entry: String,
}
