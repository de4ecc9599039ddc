//! Catalog configuration file loading.
//!
//! # Responsibility
//! - Deserialize catalog settings from a JSON file.
//! - Resolve relative paths against the config file location.
//!
//! # Invariants
//! - A loaded config always has a non-empty `db_path`.
//! - `log_dir`, when present, is absolute after loading.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Catalog settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    #[serde(default = "default_level")]
    pub log_level: String,
    /// Directory for rolling log files. Logging stays off when absent.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_level() -> String {
    default_log_level().to_string()
}

/// Errors from loading a config file.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

impl CatalogConfig {
    /// Config for an explicit database path with default logging settings.
    pub fn for_db_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            log_level: default_level(),
            log_dir: None,
        }
    }

    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.resolved_against(path.parent().unwrap_or_else(|| Path::new(".")))
    }

    /// Parses config JSON without touching the file system.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    fn resolved_against(mut self, base_dir: &Path) -> Result<Self, ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path cannot be empty".to_string()));
        }
        if self.db_path.is_relative() {
            self.db_path = base_dir.join(&self.db_path);
        }
        if let Some(log_dir) = self.log_dir.take() {
            self.log_dir = Some(if log_dir.is_relative() {
                absolute_from(base_dir)?.join(log_dir)
            } else {
                log_dir
            });
        }
        Ok(self)
    }
}

fn absolute_from(base_dir: &Path) -> Result<PathBuf, ConfigError> {
    if base_dir.is_absolute() {
        return Ok(base_dir.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|err| ConfigError::Invalid(format!("cannot resolve working directory: {err}")))?;
    Ok(cwd.join(base_dir))
}

#[cfg(test)]
mod tests {
    use super::{CatalogConfig, ConfigError};
    use std::path::{Path, PathBuf};

    #[test]
    fn parse_applies_defaults() {
        let config = CatalogConfig::from_json_str(r#"{"db_path":"catalog.sqlite"}"#).unwrap();
        assert_eq!(config.db_path, PathBuf::from("catalog.sqlite"));
        assert!(!config.log_level.is_empty());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let config = CatalogConfig::from_json_str(r#"{"db_path":"data/c.sqlite","log_dir":"logs"}"#)
            .unwrap()
            .resolved_against(Path::new("/srv/catalog"))
            .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/srv/catalog/data/c.sqlite"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/srv/catalog/logs")));
    }

    #[test]
    fn empty_db_path_is_rejected() {
        let err = CatalogConfig::from_json_str(r#"{"db_path":""}"#)
            .unwrap()
            .resolved_against(Path::new("/srv"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
