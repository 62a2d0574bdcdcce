use crate::errors::{ConfigError, ConfigResult};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Engine configuration
///
/// Controls the literal prefixes used to recognise flags and switches in
/// input, the default log level of the binary, and which frames the defect
/// trace sanitizer strips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub flag_prefix: String,
    pub switch_prefix: String,
    pub log_level: String,
    pub sanitizer: SanitizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flag_prefix: "--".to_string(),
            switch_prefix: "--".to_string(),
            log_level: "info".to_string(),
            sanitizer: SanitizerConfig::default(),
        }
    }
}

/// Frames removed from defect traces, see [`crate::sanitizer::StackTraceSanitizer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    pub ignore_modules: Vec<String>,
    pub ignore_module_prefixes: Vec<String>,
    pub ignore_functions: Vec<String>,
    pub ignore_unresolved: bool,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            ignore_modules: vec!["cmdroute::dispatcher".to_string()],
            ignore_module_prefixes: vec!["core::ops::function".to_string()],
            ignore_functions: Vec::new(),
            ignore_unresolved: false,
        }
    }
}

/// Configuration manager for the engine
///
/// Loads configuration from an explicit file, or from the global location
/// `~/.config/cmdroute/config.toml`. A missing file yields the defaults;
/// nothing is written until [`ConfigManager::save`] is called.
///
/// # Example
///
/// ```rust,no_run
/// use cmdroute::config::ConfigManager;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = ConfigManager::global()?;
///     println!("Flags start with {}", manager.config().flag_prefix);
///     Ok(())
/// }
/// ```
pub struct ConfigManager {
    config_path: PathBuf,
    config: EngineConfig,
}

impl ConfigManager {
    /// Load the configuration stored at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let config_path = path.into();
        let config = Self::read_or_default(&config_path)?;
        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load the global configuration
    pub fn global() -> ConfigResult<Self> {
        Self::load(Self::global_config_path()?)
    }

    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(base_dirs
            .home_dir()
            .join(".config")
            .join("cmdroute")
            .join("config.toml"))
    }

    fn read_or_default(path: &Path) -> ConfigResult<EngineConfig> {
        if !path.exists() {
            return Ok(EngineConfig::default());
        }
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::io(path, "read config file", e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the current configuration to disk
    ///
    /// Creates the parent directory when it does not exist yet.
    pub fn save(&self) -> ConfigResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::io(parent, "create config directory", e))?;
        }
        let content = toml::to_string_pretty(&self.config)?;
        fs::write(&self.config_path, content)
            .map_err(|e| ConfigError::io(&self.config_path, "write config file", e))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns a mutable reference to the configuration
    ///
    /// After modifying the configuration, call [`save()`](Self::save) to persist changes.
    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}
