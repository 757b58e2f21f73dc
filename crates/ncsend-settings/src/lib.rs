//! ncsend Settings Crate
//!
//! Controller variant and network target for a transfer, with JSON/TOML
//! persistence in the platform config directory.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, TransferConfig, DEFAULT_PORT, DEFAULT_TIMEOUT_MS,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
