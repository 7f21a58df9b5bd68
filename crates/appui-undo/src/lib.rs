#![forbid(unsafe_code)]

//! Undo/Redo command stack.
//!
//! This crate provides a linear history of reversible commands for
//! interactive applications. It implements the Command Pattern with:
//!
//! - **Reversibility**: Every command can be undone and redone
//! - **Macros**: Several pushes compose into one history entry, with nesting
//! - **Memory management**: Commands report a cost; the oldest entries are
//!   evicted to stay within the undo limit
//! - **Clean state**: One position can be marked as saved
//! - **Notifications**: Listeners hear about index and clean-state changes
//!
//! # Quick Start
//!
//! ```ignore
//! use appui_undo::{UndoStack, UndoCommand};
//!
//! let mut stack = UndoStack::new();
//! let _sub = stack.on_index_changed(|index| println!("index is now {index}"));
//!
//! // Apply the change yourself, then record it.
//! stack.push(Box::new(SetColorCmd::new("Set Color", old, new, store.clone())))?;
//!
//! stack.begin_macro("Reset form");
//! stack.push(Box::new(SetTextCmd::new("Clear name", name, String::new(), store.clone())))?;
//! stack.push(Box::new(SetTextCmd::new("Clear email", email, String::new(), store)))?;
//! stack.end_macro()?;
//!
//! stack.undo()?; // reverts both text edits, email first
//! ```
//!
//! # Module Structure
//!
//! - [`command`]: Core `UndoCommand` trait and command metadata
//! - [`macro_command`]: Composite `MacroCommand`
//! - [`stack`]: The `UndoStack` history
//! - [`config`]: `UndoConfig` and its loaders
//!
//! # Design Notes
//!
//! ## Merging Is Opt-In
//!
//! `UndoCommand::merge_with` lets a command absorb a later one (typing
//! "hello" as one entry instead of five). `UndoStack::push` never merges on
//! its own; callers ask for it through `UndoStack::try_merge_last` and drop
//! the absorbed command when it succeeds.
//!
//! ## Failing Commands
//!
//! A command error from `undo`/`redo` is returned to the caller after the
//! index has already moved. The stack does not roll back; treat it as a
//! corrupted history and `clear()` or reload.

pub mod command;
pub mod config;
pub mod error;
pub mod macro_command;
mod notify;
pub mod stack;

pub use command::{CommandError, CommandMetadata, CommandResult, UndoCommand};
pub use config::{ConfigError, DEFAULT_UNDO_LIMIT, UndoConfig};
pub use error::{Result, UndoError};
pub use macro_command::MacroCommand;
pub use notify::Subscription;
pub use stack::UndoStack;
