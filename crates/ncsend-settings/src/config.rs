//! Transfer configuration for ncsend
//!
//! Controller variant, controller address and port, plus the reply
//! timeout. Stored as JSON or TOML, chosen by file extension.

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default controller TCP port
pub const DEFAULT_PORT: u16 = 10000;

/// Default connect/reply timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

const CONFIG_DIR_NAME: &str = "ncsend";
const CONFIG_FILE_NAME: &str = "config.toml";

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Settings for sending a program to one controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Controller variant (`A00`, `B00`, `C00`, ...). Selects the frame line ending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// Controller hostname or IP address
    #[serde(default)]
    pub address: String,
    /// Controller TCP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connect and reply deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            controller: None,
            address: String::new(),
            port: DEFAULT_PORT,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl TransferConfig {
    /// Create a config targeting `address` with default port and timeout
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Set the controller variant
    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the timeout in milliseconds
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse a TOML document; missing fields take their defaults
    pub fn from_toml_str(content: &str) -> SettingsResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(content: &str) -> SettingsResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> SettingsResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read config from file (JSON or TOML) without validating it.
    ///
    /// Used when command-line overrides are applied before validation.
    pub fn read_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config = match format {
            ConfigFormat::Json => Self::from_json_str(&content)?,
            ConfigFormat::Toml => Self::from_toml_str(&content)?,
        };
        tracing::debug!("Loaded transfer config from {}", path.display());
        Ok(config)
    }

    /// Load and validate config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let config = Self::read_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => self.to_toml_string()?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| {
            SettingsError::SaveError(format!("{}: {}", path.display(), e))
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::MissingKey("address".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "port".to_string(),
                value: self.port.to_string(),
            });
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "timeout_ms".to_string(),
                value: self.timeout_ms.to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Platform config file location, e.g. `~/.config/ncsend/config.toml`
pub fn default_config_path() -> ConfigResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()))
}
