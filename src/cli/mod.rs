//! CLI module providing command-line interface functionality
//!
//! This module handles argument parsing and routes each subcommand to the
//! handler that drives the engine.

pub mod commands;
pub mod context;
pub mod handlers;

use anyhow::Result;
use clap::Parser;
use cmdroute::SimpleActor;

pub use commands::{Cli, Commands, ConfigAction};
pub use context::CliContext;
pub use handlers::CliHandler;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Parse command line arguments and execute the requested command
    pub fn run() -> Result<()> {
        let cli = Cli::parse();

        let actor = SimpleActor::new(cli.actor.clone()).with_permissions(cli.permissions.iter().cloned());
        let context = CliContext::new(cli.schema.clone(), cli.config.clone(), actor, cli.verbose)?;
        context.init_logging()?;

        let handler = CliHandler::new(context);
        handler.handle_command(cli.command)
    }
}
