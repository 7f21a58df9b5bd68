#![forbid(unsafe_code)]

//! Scripted demo of [`appui_undo`]: a tiny color/text store whose edits are
//! recorded on an undo stack and replayed from the command line.

pub mod cli;
pub mod commands;
pub mod error;
pub mod script;
pub mod store;

pub use cli::{Cli, Session, run, run_from_env};
pub use error::{DemoError, Result};
