//! Runtime configuration for a notes session.
//!
//! # Responsibility
//! - Describe where notes live, how long deletions stay undoable and how
//!   logging is set up.
//! - Load overrides from an optional JSON file on top of defaults.
//!
//! # Invariants
//! - A config returned by `load` or `validate` is always usable as-is.
//! - Missing fields in a config file fall back to defaults.

use crate::logging::default_log_level;
use crate::reconcile::ReconcileMode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_FILE_NAME: &str = "notes.db";
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 2_750;
pub const MIN_GRACE_PERIOD_MS: u64 = 500;
pub const MAX_GRACE_PERIOD_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    /// SQLite file holding the notes table.
    pub db_path: PathBuf,
    /// Undo window for deletions, in milliseconds.
    pub grace_period_ms: u64,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logs.
    pub log_dir: Option<PathBuf>,
    /// Drop view rows that no longer exist in the store on refresh.
    pub mirror_view: bool,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
            log_level: default_log_level().to_string(),
            log_dir: None,
            mirror_view: false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
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
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

impl NotesConfig {
    /// Loads `path` as JSON over the defaults and validates the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()
    }

    /// Checks value ranges, returning the config unchanged when valid.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(MIN_GRACE_PERIOD_MS..=MAX_GRACE_PERIOD_MS).contains(&self.grace_period_ms) {
            return Err(ConfigError::Invalid(format!(
                "grace_period_ms must be within {MIN_GRACE_PERIOD_MS}..={MAX_GRACE_PERIOD_MS}, got {}",
                self.grace_period_ms
            )));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path cannot be empty".to_string()));
        }
        if let Some(dir) = self.log_dir.as_ref() {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(self)
    }

    pub fn grace_period(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.grace_period_ms).unwrap_or(i64::MAX))
    }

    pub fn reconcile_mode(&self) -> ReconcileMode {
        if self.mirror_view {
            ReconcileMode::Mirror
        } else {
            ReconcileMode::Extend
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, NotesConfig, DEFAULT_GRACE_PERIOD_MS};
    use crate::reconcile::ReconcileMode;
    use std::io::Write;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "db_path": "/tmp/n.db", "mirror_view": true }}"#).unwrap();

        let config = NotesConfig::load(file.path()).unwrap();
        assert_eq!(config.db_path.to_str(), Some("/tmp/n.db"));
        assert_eq!(config.grace_period_ms, DEFAULT_GRACE_PERIOD_MS);
        assert_eq!(config.reconcile_mode(), ReconcileMode::Mirror);
    }

    #[test]
    fn out_of_range_grace_period_is_rejected() {
        let config = NotesConfig {
            grace_period_ms: 10,
            ..NotesConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("grace_period_ms")));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let config = NotesConfig {
            log_dir: Some("logs".into()),
            ..NotesConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = NotesConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
