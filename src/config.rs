//! Object model configuration
//!
//! Values are layered with figment: built-in defaults, then an optional
//! `prototyper.toml` in the working directory, then `PROTOTYPER_*`
//! environment variables (e.g. `PROTOTYPER_ROOT_NAME`).

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default config file looked up by [`ModelConfig::load`]
pub const CONFIG_FILE: &str = "prototyper.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PROTOTYPER_";

/// Settings that shape a root object and everything built on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `objectName` of the root object
    pub root_name: String,
    /// Joins the class-derived prefix and serial number in instance names
    pub serial_separator: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            root_name: "Prototyper".to_string(),
            serial_separator: "-".to_string(),
        }
    }
}

impl ModelConfig {
    /// Defaults + `prototyper.toml` + environment
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(ModelConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the layered configuration
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Load the layered configuration, falling back to defaults on error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!("invalid prototyper configuration, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load defaults overridden by a specific TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(ModelConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .extract()
    }
}
