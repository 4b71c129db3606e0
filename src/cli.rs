//! CLI argument definitions and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// remapd configuration tool - validate, lint, and manage remapping
/// profiles.
#[derive(Parser, Debug)]
#[command(name = "remapd", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration document (defaults to the per-user
    /// location)
    #[arg(long, short = 'c', global = true, env = "REMAPD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output: -v = debug, -vv = trace
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the configuration document and report problems
    Validate,

    /// Lint complex-modification rules in asset bundles
    Lint(LintArgs),

    /// Inspect and select profiles
    Profiles(ProfilesArgs),
}

#[derive(Args, Debug)]
pub struct LintArgs {
    /// Lint one file instead of everything in the user assets directory
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    pub command: ProfilesCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProfilesCommands {
    /// List profiles with their selection state
    List,

    /// Select the profile at the given index and save the document
    Select {
        /// Zero-based profile index, as shown by `profiles list`
        index: usize,
    },
}
