//! User configuration loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::index::DepthPolicy;
use crate::ops::ListFormat;

/// Top-level configuration.
///
/// Every field has a default, so Strata runs without a config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::from_io(e, path))?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }

    /// Loads `explicit` if given, otherwise the file at [`default_path`].
    ///
    /// An explicit path must exist. A missing default file yields
    /// [`Config::default`].
    pub fn load_or_default(explicit: Option<&Path>) -> CoreResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_path() {
            Some(path) => match Self::load(&path) {
                Err(CoreError::NotFound(_)) => Ok(Self::default()),
                other => other,
            },
            None => Ok(Self::default()),
        }
    }
}

/// `$HOME/.config/strata/config.toml`, or `None` when `HOME` is unset.
pub fn default_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("strata")
            .join("config.toml")
    })
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Registry shown in front of tags that do not name one.
    #[serde(default = "default_registry")]
    pub registry: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            registry: default_registry(),
        }
    }
}

/// Defaults for `strata ls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    #[serde(default)]
    pub format: ListFormat,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default = "default_max_depth")]
    pub max_depth: i32,
}

impl ListConfig {
    /// Depth policy for listings that pass no depth options.
    #[must_use]
    pub fn policy(&self) -> DepthPolicy {
        DepthPolicy::new(self.recursive, self.max_depth)
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            format: ListFormat::default(),
            recursive: false,
            max_depth: default_max_depth(),
        }
    }
}

/// Logging settings. `RUST_LOG` takes precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_registry() -> String {
    "localhost".to_string()
}

fn default_max_depth() -> i32 {
    -1
}

fn default_log_level() -> String {
    "warn".to_string()
}
