//! Command handlers -- one module per subcommand

pub mod check;
pub mod config;
pub mod rules;

use std::path::Path;

use joran_core::config::JoranConfig;
use joran_core::error::{ConfigError, JoranError};

use crate::error::CliError;

/// Load `joran.toml`, falling back to defaults (plus env overrides) when the
/// file does not exist.
///
/// Runs before tracing is initialised, so nothing is logged here.
pub async fn load_config(path: &Path) -> Result<JoranConfig, CliError> {
    match JoranConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(JoranError::Config(ConfigError::FileNotFound { .. })) => {
            let mut config = JoranConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

