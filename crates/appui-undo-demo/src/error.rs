#![forbid(unsafe_code)]

use thiserror::Error;

use appui_undo::{ConfigError, UndoError};

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("invalid step `{step}`: {reason}")]
    InvalidStep { step: String, reason: String },

    #[error("invalid color `{value}`: expected a name or #rrggbb")]
    InvalidColor { value: String },

    #[error("unsupported config file `{path}`: expected a .toml or .json extension")]
    UnsupportedConfig { path: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("step {position} (`{step}`) failed: {source}")]
    Undo {
        position: usize,
        step: String,
        #[source]
        source: UndoError,
    },
}

impl DemoError {
    pub fn invalid_step(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStep {
            step: step.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidStep { .. }
            | Self::InvalidColor { .. }
            | Self::UnsupportedConfig { .. } => 2,
            Self::Config(_) => 3,
            Self::Undo { .. } => 1,
        }
    }
}
