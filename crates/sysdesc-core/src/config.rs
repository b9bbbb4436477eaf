//! Explicit runtime configuration.
//!
//! Read from TOML and passed down to the entry points that need it:
//!
//! ```toml
//! format_version = 3
//! store_dir = "/var/lib/sysdesc"
//! log_profile = "production"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::description::CURRENT_FORMAT_VERSION;
use crate::errors::{ExError, ExErrorKind};
use crate::logging_facility::Profile;

const STORE_DIR_NAME: &str = ".sysdesc";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Version descriptions are upgraded to and required to have
    pub format_version: u32,
    /// Root of the description store
    pub store_dir: PathBuf,
    pub log_profile: Profile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            store_dir: default_store_dir(),
            log_profile: Profile::default(),
        }
    }
}

/// `$HOME/.sysdesc`, or `./.sysdesc` without a home directory
pub fn default_store_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STORE_DIR_NAME)
}

impl Config {
    /// # Errors
    ///
    /// `Config` if the text is not valid TOML or has unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ExError> {
        toml::from_str(text).map_err(|e| {
            ExError::new(ExErrorKind::Config)
                .with_op("config_parse")
                .with_message(e.to_string())
        })
    }

    /// Load from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// `Io` if the file exists but cannot be read, `Config` if it does not
    /// parse.
    pub fn load(path: &Path) -> Result<Self, ExError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("config_load")
                .with_entity_id(path.display().to_string())
                .with_message(e.to_string())
        })?;
        Self::from_toml_str(&text).map_err(|e| e.with_entity_id(path.display().to_string()))
    }

    pub fn with_store_dir(mut self, store_dir: impl Into<PathBuf>) -> Self {
        self.store_dir = store_dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str("store_dir = \"/srv/descriptions\"").unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/srv/descriptions"));
        assert_eq!(config.format_version, CURRENT_FORMAT_VERSION);
        assert_eq!(config.log_profile, Profile::Development);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml_str("colour = \"blue\"").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load(Path::new("/nonexistent/sysdesc.toml")).unwrap();
        assert_eq!(config.format_version, CURRENT_FORMAT_VERSION);
    }
}
