//! # Configuration Loader
//!
//! Optional `xsecdb.toml` in the working directory supplies defaults
//! for flags the user did not pass. Flags always win over the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use xsecdb_core::XsecError;

/// Name of the optional config file.
const CONFIG_FILE: &str = "xsecdb.toml";

/// Defaults loaded from `xsecdb.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default database path.
    pub database: Option<PathBuf>,
    /// Default contributing organization for submissions.
    pub organization: Option<String>,
}

impl Config {
    /// Load the config file from the working directory, if present.
    pub fn load() -> Result<Self, XsecError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    fn load_from(path: &Path) -> Result<Self, XsecError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text =
            std::fs::read_to_string(path).map_err(|e| XsecError::IoError(e.to_string()))?;
        toml::from_str(&text).map_err(|e| {
            XsecError::SerializationError(format!("invalid {}: {e}", path.display()))
        })
    }
}
