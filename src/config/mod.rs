//! TOML configuration loading.
//!
//! Separated from struct definitions so the loading logic (default location,
//! missing-file fallback) stays independent of the serde schema.

mod structs;

pub use structs::{DEFAULT_MAX_SIZE_MB, GeneralConfig, RotationConfig};

use crate::Error;
use crate::internal;
use crate::level::Level;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

/// Every section is `#[serde(default)]`; an empty file yields the defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Diagnostic level for the crate's own stderr output.
    pub general: GeneralConfig,
    /// Size, age and count limits plus compression.
    pub rotation: RotationConfig,
}

impl Config {
    /// Loads from the platform config directory, falling back to defaults when
    /// no file exists there.
    ///
    /// # Errors
    /// The file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, Error> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                internal::debug("CONFIG", "No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Loads an explicit file. A missing file yields defaults.
    ///
    /// # Errors
    /// The file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                internal::debug(
                    "CONFIG",
                    &format!("{} not found, using defaults", path.display()),
                );
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(Error::ConfigRead {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        let config = Self::parse(&content)?;
        internal::debug("CONFIG", &format!("Config loaded from {}", path.display()));
        Ok(config)
    }

    /// # Errors
    /// TOML syntax or type errors.
    pub fn parse(content: &str) -> Result<Self, Error> {
        Ok(toml::from_str(content)?)
    }

    /// `<config dir>/lumberjack/config.toml` per the platform's conventions.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "lumberjack")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Config stores level as a string for TOML ergonomics; unknown strings fall back to info.
    #[must_use]
    pub fn parse_level(&self) -> Level {
        self.general.level.parse().unwrap_or(Level::Info)
    }
}
