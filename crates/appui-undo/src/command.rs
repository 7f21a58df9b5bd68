#![forbid(unsafe_code)]

//! Undoable command abstraction.
//!
//! This module provides the [`UndoCommand`] trait for reversible operations
//! pushed onto an [`UndoStack`](crate::UndoStack).
//!
//! # Design Principles
//!
//! 1. **Explicit state**: Commands capture all state needed for undo/redo,
//!    independently of the current live state
//! 2. **Accounted**: Commands report a memory cost for budget management
//! 3. **Mergeable**: A command may absorb a later one (e.g., typing), but
//!    only when the caller asks for it
//! 4. **Disposable**: Commands are told when the stack drops them for good
//!
//! # Invariants
//!
//! - `redo()` followed by `undo()` restores prior state exactly
//! - `undo()` followed by `redo()` restores the applied state exactly
//! - `memory_size()` MUST be stable while the command sits in a stack,
//!   except across a successful `merge_with`; the stack re-checks its budget
//!   after every merge
//! - `name()` only changes when `merge_with` absorbs a later command
//!
//! # Failure Modes
//!
//! - **Stale reference**: Command holds a reference to a deleted target
//!   - Mitigation: return [`CommandError::TargetNotFound`] from undo/redo
//! - **State drift**: External changes invalidate undo data
//!   - Mitigation: clear the stack on external modifications

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Metadata shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMetadata {
    /// Human-readable label for UI (e.g., "Set Color").
    name: String,
    /// Set once the command has been merged into another one.
    obsolete: bool,
}

impl CommandMetadata {
    /// Create new metadata with the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            obsolete: false,
        }
    }

    /// Display name of the command.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a merge has superseded the command.
    #[must_use]
    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    pub fn set_obsolete(&mut self, obsolete: bool) {
        self.obsolete = obsolete;
    }

    /// Replace the display name, e.g. when a merge changed what the command does.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

/// Result of command undo or redo.
pub type CommandResult = Result<(), CommandError>;

/// Errors a command can report from `undo` or `redo`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The object the command mutates no longer exists.
    #[error("target {0} not found")]
    TargetNotFound(String),
    /// Command cannot be applied in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// A reversible unit of work held by an [`UndoStack`](crate::UndoStack).
///
/// The stack calls `undo` and `redo` exactly once per logical step, so an
/// implementation may assume the state it left behind on the previous call.
/// Commands are pushed *after* their effect has been applied.
pub trait UndoCommand {
    /// Identifier of the command *type*, used for merge compatibility.
    fn id(&self) -> &str;

    /// Cost of this command against the stack's undo limit.
    fn memory_size(&self) -> u64;

    /// Revert the command's effect.
    fn undo(&mut self) -> CommandResult;

    /// Re-apply the command's effect after an undo.
    fn redo(&mut self) -> CommandResult;

    /// Called once when the stack permanently discards the command
    /// (evicted, truncated by a new push, or cleared).
    fn on_flush(&mut self);

    /// Try to absorb `other` into `self`.
    ///
    /// Returns `true` when `other`'s effect is now represented by `self`.
    /// The default implementation never merges.
    fn merge_with(&mut self, _other: &dyn UndoCommand) -> bool {
        false
    }

    /// Get the command metadata.
    fn metadata(&self) -> &CommandMetadata;

    /// Get the command metadata mutably.
    fn metadata_mut(&mut self) -> &mut CommandMetadata;

    /// Downcast to concrete type for merging.
    fn as_any(&self) -> &dyn Any;

    /// Display name of the command.
    fn name(&self) -> &str {
        self.metadata().name()
    }

    fn is_obsolete(&self) -> bool {
        self.metadata().is_obsolete()
    }

    fn set_obsolete(&mut self, obsolete: bool) {
        self.metadata_mut().set_obsolete(obsolete);
    }

    /// Debug description of the command.
    fn debug_name(&self) -> &'static str {
        "UndoCommand"
    }
}

impl fmt::Debug for dyn UndoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.debug_name())
            .field("id", &self.id())
            .field("name", &self.name())
            .field("memory_size", &self.memory_size())
            .field("obsolete", &self.is_obsolete())
            .finish()
    }
}
