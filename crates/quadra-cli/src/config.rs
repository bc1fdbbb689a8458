//! CLI configuration.
//!
//! Loaded from a TOML file; every section has defaults so a missing file or
//! missing keys are fine.

use anyhow::Context;
use quadra_types::Address;
use quadra_voting::{EngineConfig, DEFAULT_INITIAL_CREDITS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "quadra.toml";

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadraConfig {
    /// Engine parameters used by `init`
    pub engine: EngineSection,
    /// State file location
    pub storage: StorageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Admin identity (bech32m or 0x-hex)
    pub admin: Option<Address>,
    /// Credits granted to every voter
    pub initial_credits: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            admin: None,
            initial_credits: DEFAULT_INITIAL_CREDITS,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON state file
    pub state_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("./data/quadra-state.json"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive, e.g. "info" or "quadra_voting=debug"
    pub level: String,
    /// JSON log lines instead of human-readable output
    pub json: bool,
    /// Append logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
            file: None,
        }
    }
}

impl QuadraConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `quadra.toml` in the working
    /// directory is used if present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config: QuadraConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file '{}'", path.display()))?;
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.state_file.as_os_str().is_empty() {
            anyhow::bail!("storage.state_file cannot be empty");
        }
        if self.engine.admin.is_some_and(|admin| admin.is_zero()) {
            anyhow::bail!("engine.admin cannot be the zero address");
        }
        if self.logging.level.trim().is_empty() {
            anyhow::bail!("logging.level cannot be empty");
        }
        Ok(())
    }

    /// Engine configuration for `init`, with an optional admin override.
    pub fn engine_config(&self, admin: Option<Address>) -> anyhow::Result<EngineConfig> {
        let admin = admin
            .or(self.engine.admin)
            .context("No admin given: pass --admin or set engine.admin in the config file")?;
        Ok(EngineConfig::new(admin).with_initial_credits(self.engine.initial_credits))
    }
}
