//! Configuration file
//!
//! Optional JSON document. Every field has a default, so an absent file
//! and `{}` behave the same.
//!
//! ```json
//! {
//!   "storage_dir": "/var/lib/clips",
//!   "extension": "ls",
//!   "sync_writes": true,
//!   "log_level": "warn",
//!   "max_ancestry_depth": 4096
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Severity};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "lasagna.json";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding container and index files
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Container file extension; the index adds `.idx`
    #[serde(default = "default_extension")]
    pub extension: String,

    /// fsync container and index after every insertion
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    /// Minimum log severity: trace, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on parent links followed by an ancestry walk
    #[serde(default = "default_max_ancestry_depth")]
    pub max_ancestry_depth: usize,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_extension() -> String {
    "ls".to_string()
}
fn default_sync_writes() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_max_ancestry_depth() -> usize {
    4096
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            extension: default_extension(),
            sync_writes: default_sync_writes(),
            log_level: default_log_level(),
            max_ancestry_depth: default_max_ancestry_depth(),
        }
    }
}

impl Config {
    /// Load and validate configuration from file
    ///
    /// Nothing is logged here: the log level is only known once the file
    /// is parsed. Callers emit `CONFIG_LOADED` through `log_loaded`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Config file to read: `path` if given, else `./lasagna.json` if
    /// present. `None` means defaults apply.
    pub fn locate(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                fallback.is_file().then(|| fallback.to_path_buf())
            }
        }
    }

    /// Emits `CONFIG_LOADED` for a configuration read from `path`.
    pub fn log_loaded(&self, path: &Path) {
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("storage_dir", &self.storage_dir.display().to_string()),
            ],
        );
    }

    /// Validate field values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extension.is_empty()
            || self
                .extension
                .chars()
                .any(|c| c == '.' || c == '/' || c == '\\')
        {
            return Err(ConfigError::Invalid {
                field: "extension",
                reason: format!(
                    "'{}' must be non-empty without dots or path separators",
                    self.extension
                ),
            });
        }

        self.log_severity()?;

        if self.max_ancestry_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_ancestry_depth",
                reason: "must be > 0".to_string(),
            });
        }

        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> Result<Severity, ConfigError> {
        self.log_level
            .parse()
            .map_err(|reason| ConfigError::Invalid {
                field: "log_level",
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_object_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lasagna.json");
        fs::write(&path, "{}").unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_fields_are_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lasagna.json");
        fs::write(
            &path,
            r#"{"storage_dir": "/data/clips", "extension": "clips", "sync_writes": false, "log_level": "info", "max_ancestry_depth": 8}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/data/clips"));
        assert_eq!(config.extension, "clips");
        assert!(!config.sync_writes);
        assert_eq!(config.log_severity().unwrap(), Severity::Info);
        assert_eq!(config.max_ancestry_depth, 8);
    }

    #[test]
    fn test_bad_extension_rejected() {
        let config = Config {
            extension: "ls.bak".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "extension",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = Config {
            max_ancestry_depth: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let config = Config {
            log_level: "chatty".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fatal_log_level_rejected() {
        let config = Config {
            log_level: "fatal".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "log_level",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_json_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope.json");

        assert_eq!(Config::locate(Some(&path)), Some(path.clone()));
        assert!(matches!(Config::load(&path), Err(ConfigError::Read { .. })));
    }
}
