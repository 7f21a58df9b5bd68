#![forbid(unsafe_code)]

//! Step scripts driving the demo.
//!
//! A script is a list of words such as `color=red text=hi undo redo`. Each
//! word is parsed into a [`Step`] before anything runs, so a typo late in the
//! script never leaves a half-applied history behind.

use std::fmt;
use std::str::FromStr;

use crate::error::{DemoError, Result};
use crate::store::Color;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Set the color and push the edit.
    Color(Color),
    /// Replace the text and push the edit.
    Text(String),
    /// Append to the text, merging with the previous text edit when possible.
    Type(String),
    Undo,
    Redo,
    Index(isize),
    BeginMacro(String),
    EndMacro,
    Clean,
    ResetClean,
    Clear,
}

impl FromStr for Step {
    type Err = DemoError;

    fn from_str(word: &str) -> Result<Self> {
        let (key, value) = match word.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (word, None),
        };

        let step = match (key, value) {
            ("color", Some(value)) => Self::Color(value.parse()?),
            ("text", Some(value)) => Self::Text(value.to_string()),
            ("type", Some(value)) => Self::Type(value.to_string()),
            ("index", Some(value)) => Self::Index(
                value
                    .parse()
                    .map_err(|_| DemoError::invalid_step(word, "index must be an integer"))?,
            ),
            ("begin", Some(value)) if !value.is_empty() => Self::BeginMacro(value.to_string()),
            ("begin", _) => return Err(DemoError::invalid_step(word, "begin needs a macro name")),
            ("undo", None) => Self::Undo,
            ("redo", None) => Self::Redo,
            ("end", None) => Self::EndMacro,
            ("clean", None) => Self::Clean,
            ("reset-clean", None) => Self::ResetClean,
            ("clear", None) => Self::Clear,
            ("undo" | "redo" | "end" | "clean" | "reset-clean" | "clear", Some(_)) => {
                return Err(DemoError::invalid_step(word, "takes no value"));
            }
            ("color" | "text" | "type" | "index", None) => {
                return Err(DemoError::invalid_step(word, "missing `=value`"));
            }
            _ => return Err(DemoError::invalid_step(word, "unknown step")),
        };
        Ok(step)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(color) => write!(f, "color={color}"),
            Self::Text(text) => write!(f, "text={text}"),
            Self::Type(text) => write!(f, "type={text}"),
            Self::Undo => f.write_str("undo"),
            Self::Redo => f.write_str("redo"),
            Self::Index(index) => write!(f, "index={index}"),
            Self::BeginMacro(name) => write!(f, "begin={name}"),
            Self::EndMacro => f.write_str("end"),
            Self::Clean => f.write_str("clean"),
            Self::ResetClean => f.write_str("reset-clean"),
            Self::Clear => f.write_str("clear"),
        }
    }
}

/// Parse every word, failing on the first bad one.
pub fn parse_steps<S: AsRef<str>>(words: &[S]) -> Result<Vec<Step>> {
    words.iter().map(|w| w.as_ref().parse()).collect()
}
