//! CLI Context for dependency injection and shared state
//!
//! This module provides the CliContext abstraction that centralizes
//! configuration, the acting identity and the optional schema path.

use anyhow::Result;
use cmdroute::{ConfigManager, SimpleActor};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI execution context containing shared dependencies and configuration
#[derive(Clone)]
pub struct CliContext {
    pub schema_path: Option<PathBuf>,
    pub verbose: bool,
    pub actor: SimpleActor,
    pub config_manager: Arc<ConfigManager>,
}

impl CliContext {
    /// Create a new CLI context
    ///
    /// Loads the configuration from `config_path`, or from the global location
    /// when no path is given.
    pub fn new(
        schema_path: Option<PathBuf>,
        config_path: Option<PathBuf>,
        actor: SimpleActor,
        verbose: bool,
    ) -> Result<Self> {
        let config_manager = match config_path {
            Some(path) => ConfigManager::load(path)?,
            None => ConfigManager::global()?,
        };

        Ok(Self {
            schema_path,
            verbose,
            actor,
            config_manager: Arc::new(config_manager),
        })
    }

    /// Initialize logging subsystem based on verbosity and configuration
    pub fn init_logging(&self) -> Result<()> {
        let log_level = if self.verbose {
            "debug"
        } else {
            &self.config_manager.config().log_level
        };

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(log_level.parse().unwrap_or_else(|_| tracing::Level::INFO.into())),
            )
            .init();

        if self.verbose {
            tracing::debug!("Verbose logging enabled");
            tracing::debug!("Schema path: {:?}", self.schema_path);
            tracing::debug!("Config path: {:?}", self.config_manager.path());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_creation() {
        let temp_dir = TempDir::new().unwrap();
        let context = CliContext::new(
            None,
            Some(temp_dir.path().join("config.toml")),
            SimpleActor::new("tester"),
            false,
        )
        .unwrap();

        assert!(context.schema_path.is_none());
        assert!(!context.verbose);
        assert_eq!(context.config_manager.config().flag_prefix, "--");
    }

    #[test]
    fn test_context_rejects_malformed_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "log_level = ").unwrap();

        let result = CliContext::new(None, Some(path), SimpleActor::new("tester"), true);
        assert!(result.is_err());
    }
}
