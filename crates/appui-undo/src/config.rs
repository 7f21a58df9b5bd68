#![forbid(unsafe_code)]

//! Configuration for [`UndoStack`](crate::UndoStack).
//!
//! # Loading
//!
//! With the `config` feature the configuration can be loaded from TOML or
//! JSON. Missing fields keep their defaults.
//!
//! ```toml
//! # undo.toml
//! undo_limit = 250000
//! ```
//!
//! ```rust,ignore
//! let config = UndoConfig::from_toml_file("undo.toml")?.validated()?;
//! let stack = UndoStack::with_config(config);
//! ```

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default cumulative memory budget of a stack.
pub const DEFAULT_UNDO_LIMIT: u64 = 1_000_000;

/// Tunable parameters of an undo stack.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct UndoConfig {
    /// Maximum cumulative `memory_size` of the retained history.
    pub undo_limit: u64,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            undo_limit: DEFAULT_UNDO_LIMIT,
        }
    }
}

impl UndoConfig {
    /// Create a configuration with a custom undo limit.
    #[must_use]
    pub fn new(undo_limit: u64) -> Self {
        Self { undo_limit }
    }

    /// Configuration whose budget is only exceeded when the total would
    /// overflow `u64`; then the oldest entries are evicted as usual.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            undo_limit: u64::MAX,
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.undo_limit == 0 {
            errors.push("undo_limit must be greater than 0".to_string());
        }
        errors
    }

    /// Return `self` if valid, otherwise the list of problems.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors from loading or validating an [`UndoConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid undo config: {}", .0.join("; "))]
    Validation(Vec<String>),
}
