//! Command definitions and structures for the CLI
//!
//! This module contains the clap-based command line argument definitions,
//! including the main CLI structure and all subcommands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "cmdroute")]
#[command(about = "Resolve and dispatch command lines against a declared command tree")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Command schema (TOML) declaring the command tree
    #[arg(short, long, global = true, env = "CMDROUTE_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Engine configuration file (defaults to ~/.config/cmdroute/config.toml)
    #[arg(short, long, global = true, env = "CMDROUTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Name of the actor running the command
    #[arg(long = "as", global = true, default_value = "console")]
    pub actor: String,

    /// Permission node granted to the actor (repeatable, `*` grants all)
    #[arg(short, long = "permission", global = true)]
    pub permissions: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Dispatch one command line and print the resolved arguments
    Run {
        /// The command line, e.g. `set alice 5`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print completion suggestions for the last token of a partial line
    Complete {
        /// The partial command line; a trailing space starts a new token
        line: String,

        /// Print suggestions as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Show the registered command tree
    Tree,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
