//! Config loading from a json5 file plus environment credential overrides.
//!
//! The file is optional: a missing path yields defaults so the gateway can
//! start from environment variables alone. Credentials are never written to
//! the config file by the gateway; the environment is the expected source.

use crate::{ConfigError, ConsiliumConfig};
use directories::BaseDirs;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Default config filename under the config directory.
const DEFAULT_CONFIG_FILE: &str = "consilium.json5";
/// Default config directory under the user's home.
const DEFAULT_CONFIG_DIR: &str = ".consilium";

/// Environment variable carrying the Gemini credential.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Environment variable carrying the Grok credential.
pub const GROK_API_KEY_VAR: &str = "GROK_API_KEY";

/// Options controlling config discovery.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path; the default location is used when absent.
    pub config_path: Option<PathBuf>,
    /// Skip reading credentials from the process environment.
    pub ignore_env: bool,
}

/// Load, validate, and return the effective config.
pub fn load_config(options: &LoadOptions) -> Result<ConsiliumConfig, ConfigError> {
    let path = options
        .config_path
        .clone()
        .unwrap_or_else(default_config_path);
    let mut config = if path.exists() {
        info!("loading config (path={})", path.display());
        parse_file(&path)?
    } else {
        debug!("config file absent, using defaults (path={})", path.display());
        ConsiliumConfig::default()
    };

    if !options.ignore_env {
        apply_env_credentials(&mut config);
    }

    config.validate()?;
    Ok(config)
}

/// Parse a json5 config file into the schema.
fn parse_file(path: &Path) -> Result<ConsiliumConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let config: ConsiliumConfig = json5::from_str(&raw)?;
    Ok(config)
}

/// Resolve the default config path under the user's home directory.
fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        return dirs
            .home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE);
    }
    PathBuf::from(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE)
}

/// Overlay provider credentials from the environment.
fn apply_env_credentials(config: &mut ConsiliumConfig) {
    if let Ok(key) = std::env::var(GEMINI_API_KEY_VAR)
        && !key.is_empty()
    {
        debug!("gemini credential loaded from environment");
        config.providers.gemini.api_key = Some(key);
    }
    if let Ok(key) = std::env::var(GROK_API_KEY_VAR)
        && !key.is_empty()
    {
        debug!("grok credential loaded from environment");
        config.providers.grok.api_key = Some(key);
    }
}
