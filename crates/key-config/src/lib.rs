//! Configuration loading and parsing for the key engine.
//!
//! Scope: parse `keymode.toml` (or an override path provided by the host)
//! extracting the `[input]` table. `maxmapdepth` bounds mapping-expansion
//! recursion; `timeout` / `timeoutlen` are carried for hosts that implement
//! ambiguity timeouts themselves (the engine runs no timers).
//!
//! Unknown fields are ignored (TOML deserialization tolerance) and a file
//! that fails to parse falls back to defaults with a logged warning, so a
//! broken config never prevents the host from starting.

use std::{fs, path::PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Maximum number of nested mapping expansions for one typed key.
    #[serde(default = "InputConfig::default_maxmapdepth")]
    pub maxmapdepth: u32,
    #[serde(default = "InputConfig::default_timeout")]
    pub timeout: bool,
    #[serde(default = "InputConfig::default_timeoutlen")]
    pub timeoutlen: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            maxmapdepth: Self::default_maxmapdepth(),
            timeout: Self::default_timeout(),
            timeoutlen: Self::default_timeoutlen(),
        }
    }
}

impl InputConfig {
    // Vim defaults.
    const fn default_maxmapdepth() -> u32 {
        1000
    }
    const fn default_timeout() -> bool {
        true
    }
    const fn default_timeoutlen() -> u32 {
        1000
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Original file contents, when a file was found.
    pub raw: Option<String>,
    pub file: ConfigFile,
}

/// Best-effort config path following platform conventions: a local
/// `keymode.toml` wins over the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("keymode.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("keymode").join("keymode.toml");
    }
    PathBuf::from("keymode.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Config {
                raw: Some(content),
                file,
            }),
            Err(error) => {
                warn!(target: "config", path = %path.display(), %error, "config parse failed, using defaults");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}
