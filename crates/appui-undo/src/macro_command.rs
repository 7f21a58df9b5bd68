#![forbid(unsafe_code)]

//! Composite command grouping several commands into one history entry.

use std::any::Any;
use std::fmt;

use crate::command::{CommandMetadata, CommandResult, UndoCommand};

/// A command that undoes and redoes a list of child commands together.
///
/// Children are redone in insertion order and undone in reverse order, so
/// the last pushed child unwinds first. Usually built by
/// [`UndoStack::begin_macro`](crate::UndoStack::begin_macro), but it can be
/// assembled by hand and pushed like any other command.
pub struct MacroCommand {
    /// Children in application order.
    commands: Vec<Box<dyn UndoCommand>>,
    metadata: CommandMetadata,
}

impl fmt::Debug for MacroCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroCommand")
            .field("name", &self.metadata.name())
            .field("commands", &self.commands)
            .finish()
    }
}

impl MacroCommand {
    /// Type identifier reported by [`UndoCommand::id`].
    pub const ID: &'static str = "MacroCommand";

    /// Create an empty macro.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            commands: Vec::new(),
            metadata: CommandMetadata::new(name),
        }
    }

    /// Append a child command.
    pub fn add(&mut self, command: Box<dyn UndoCommand>) {
        self.commands.push(command);
    }

    /// Child at `index`, or `None` when out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&dyn UndoCommand> {
        self.commands.get(index).map(|c| c.as_ref())
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Children in application order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &dyn UndoCommand> {
        self.commands.iter().map(|c| c.as_ref())
    }
}

impl UndoCommand for MacroCommand {
    fn id(&self) -> &str {
        Self::ID
    }

    fn memory_size(&self) -> u64 {
        self.commands
            .iter()
            .fold(0u64, |total, c| total.saturating_add(c.memory_size()))
    }

    fn undo(&mut self) -> CommandResult {
        for cmd in self.commands.iter_mut().rev() {
            cmd.undo()?;
        }
        Ok(())
    }

    fn redo(&mut self) -> CommandResult {
        for cmd in &mut self.commands {
            cmd.redo()?;
        }
        Ok(())
    }

    fn on_flush(&mut self) {
        for cmd in self.commands.iter_mut().rev() {
            cmd.on_flush();
        }
        self.commands.clear();
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut CommandMetadata {
        &mut self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn debug_name(&self) -> &'static str {
        "MacroCommand"
    }
}
