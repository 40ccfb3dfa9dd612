//! Bridge configuration
//!
//! Read from an optional `monovox.toml` in the working directory, then
//! overridden by `MONOVOX_`-prefixed environment variables. Nested keys use a
//! double underscore, e.g. `MONOVOX_BACKEND__RESAMPLING_QUALITY=fast`.

use crate::error::{BridgeError, Result};
use monovox_cpal::CpalBackendConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE: &str = "monovox.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "MONOVOX";

/// Settings for the process-wide bridge
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// HRTF request used when a call does not say
    #[serde(default = "default_hrtf")]
    pub default_hrtf: bool,

    /// Output backend settings
    #[serde(default)]
    pub backend: CpalBackendConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_hrtf: default_hrtf(),
            backend: CpalBackendConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from `monovox.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(
            Some(Path::new(CONFIG_FILE)),
            config::Environment::with_prefix(ENV_PREFIX),
        )
    }

    /// Load from an optional file and an environment source
    pub fn load_from(path: Option<&Path>, environment: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        // Load from config file if it exists
        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
        }

        settings = settings.add_source(
            environment
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .map_err(|e| BridgeError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| BridgeError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.backend.command_capacity == 0 {
            return Err(BridgeError::Config(
                "backend.command_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_hrtf() -> bool {
    true
}
