#![forbid(unsafe_code)]

//! Linear undo/redo history.
//!
//! This module provides the [`UndoStack`], which keeps every top-level
//! command in one ordered list plus a cursor (`index`) pointing at the last
//! applied entry:
//!
//! - **Memory budget**: Oldest commands evicted when the undo limit is hit
//! - **Branch handling**: A push after an undo drops the redo tail
//! - **Macros**: Pushes between `begin_macro`/`end_macro` form one entry
//! - **Clean state**: One position can be marked as "saved"
//!
//! # Invariants
//!
//! 1. `-1 <= index < count`
//! 2. Sum of `memory_size()` over the history `<= undo_limit` after every
//!    successful push or merge
//! 3. Undo/redo are disabled while a macro is being composed
//! 4. Every command that leaves the stack is flushed exactly once
//!
//! # Memory Model
//!
//! ```text
//! push(c5), limit = 4 units
//! ┌───────────────────────────────────────────────┐
//! │ [c1, c2, c3, c4]            index = 3         │
//! │ evict c1 (oldest) ──►  [c2, c3, c4, c5]       │
//! │                             index = 3         │
//! └───────────────────────────────────────────────┘
//!
//! undo() x2, then push(c6)  <-- new branch
//! ┌───────────────────────────────────────────────┐
//! │ [c2, c3, c4, c5]            index = 1         │
//! │ flush c5, c4 (newest first) ──► [c2, c3, c6]  │
//! │                             index = 2         │
//! └───────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::command::{CommandError, UndoCommand};
use crate::config::UndoConfig;
use crate::error::{Result, UndoError};
use crate::macro_command::MacroCommand;
use crate::notify::{Listeners, Subscription};

/// Clean-state sentinel meaning "no position marked".
const CLEAN_UNSET: isize = -1;

/// Ordered undo/redo history with macro composition and clean tracking.
///
/// Commands are pushed *after* their effect has been applied. The stack is
/// meant to be owned per document or editing context.
pub struct UndoStack {
    /// Top-level history, oldest first. A deque so eviction pops the front.
    commands: VecDeque<Box<dyn UndoCommand>>,
    /// Macros being composed, innermost last.
    macro_stack: Vec<MacroCommand>,
    /// Position of the last applied command, `-1` before the first one.
    index: isize,
    /// Position marked clean, or [`CLEAN_UNSET`].
    clean_state: isize,
    config: UndoConfig,
    index_listeners: Listeners<isize>,
    clean_listeners: Listeners<()>,
}

impl fmt::Debug for UndoStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoStack")
            .field("count", &self.commands.len())
            .field("index", &self.index)
            .field("clean_state", &self.clean_state)
            .field("macro_depth", &self.macro_stack.len())
            .field("memory_size", &self.memory_size())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    /// Create an empty stack with the default undo limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(UndoConfig::default())
    }

    /// Create an empty stack with the given configuration.
    #[must_use]
    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            commands: VecDeque::new(),
            macro_stack: Vec::new(),
            index: -1,
            clean_state: CLEAN_UNSET,
            config,
            index_listeners: Listeners::default(),
            clean_listeners: Listeners::default(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether [`undo`](Self::undo) would move the index.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index >= 0 && !self.is_composing()
    }

    /// Whether [`redo`](Self::redo) would move the index.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index < self.count_isize() - 1 && !self.is_composing()
    }

    /// Number of top-level entries (a macro counts as one).
    #[must_use]
    pub fn count(&self) -> usize {
        self.commands.len()
    }

    /// Position of the last applied command, `-1` when nothing is applied.
    #[must_use]
    pub fn index(&self) -> isize {
        self.index
    }

    /// Whether the current position is the one marked clean.
    ///
    /// An empty history with no clean mark is clean.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        (self.commands.is_empty() && self.clean_state == CLEAN_UNSET)
            || self.clean_state == self.index
    }

    /// Position marked clean, `-1` when unset.
    #[must_use]
    pub fn clean_index(&self) -> isize {
        self.clean_state
    }

    /// Cumulative memory cost of the retained history, saturating at
    /// `u64::MAX`.
    #[must_use]
    pub fn memory_size(&self) -> u64 {
        self.commands
            .iter()
            .fold(0u64, |total, c| total.saturating_add(c.memory_size()))
    }

    /// Command at the current index.
    #[must_use]
    pub fn last_command(&self) -> Option<&dyn UndoCommand> {
        self.get(self.index)
    }

    /// Entry at `index`, or `None` when out of range.
    #[must_use]
    pub fn get(&self, index: isize) -> Option<&dyn UndoCommand> {
        let i = usize::try_from(index).ok()?;
        self.commands.get(i).map(|c| c.as_ref())
    }

    /// Snapshot view of the history, oldest first.
    pub fn commands(&self) -> impl ExactSizeIterator<Item = &dyn UndoCommand> {
        self.commands.iter().map(|c| c.as_ref())
    }

    /// Name of the command the next [`undo`](Self::undo) would revert.
    #[must_use]
    pub fn undo_text(&self) -> Option<&str> {
        if self.can_undo() {
            self.last_command().map(|c| c.name())
        } else {
            None
        }
    }

    /// Name of the command the next [`redo`](Self::redo) would re-apply.
    #[must_use]
    pub fn redo_text(&self) -> Option<&str> {
        if self.can_redo() {
            self.get(self.index + 1).map(|c| c.name())
        } else {
            None
        }
    }

    /// Whether a macro is currently open.
    #[must_use]
    pub fn is_composing(&self) -> bool {
        !self.macro_stack.is_empty()
    }

    /// Number of nested macros currently open.
    #[must_use]
    pub fn macro_depth(&self) -> usize {
        self.macro_stack.len()
    }

    #[must_use]
    pub fn config(&self) -> &UndoConfig {
        &self.config
    }

    #[must_use]
    pub fn undo_limit(&self) -> u64 {
        self.config.undo_limit
    }

    /// Change the undo limit. The budget is enforced on the next push.
    pub fn set_undo_limit(&mut self, limit: u64) {
        self.config.undo_limit = limit;
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Call `callback` with the new index every time the index changes.
    pub fn on_index_changed(&mut self, callback: impl Fn(isize) + 'static) -> Subscription {
        self.index_listeners.subscribe(move |index| callback(*index))
    }

    /// Call `callback` every time [`is_clean`](Self::is_clean) may have flipped
    /// because the clean mark moved.
    pub fn on_clean_changed(&mut self, callback: impl Fn() + 'static) -> Subscription {
        self.clean_listeners.subscribe(move |_| callback())
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Push an already-applied command.
    ///
    /// While a macro is open the command joins the innermost macro. Otherwise
    /// the redo tail is flushed, the oldest entries are evicted until the new
    /// command fits, and the index moves to the new entry.
    ///
    /// Merging is never attempted here; see [`try_merge_last`](Self::try_merge_last).
    ///
    /// # Errors
    ///
    /// [`UndoError::CapacityExceeded`] if the command alone exceeds the undo
    /// limit. The stack is left unchanged and the command is dropped.
    pub fn push(&mut self, command: Box<dyn UndoCommand>) -> Result<()> {
        let size = command.memory_size();
        self.check_fits(size)?;

        let depth = self.macro_stack.len();
        if let Some(open) = self.macro_stack.last_mut() {
            trace!(name = command.name(), depth, "macro add");
            open.add(command);
            return Ok(());
        }

        self.truncate_redo_tail();
        let limit = self.config.undo_limit;
        let mut total = self.memory_size();
        // A sum that overflows u64 is over any limit.
        while total.checked_add(size).is_none_or(|t| t > limit) && !self.commands.is_empty() {
            total = total.saturating_sub(self.evict_oldest());
        }

        debug!(
            name = command.name(),
            memory_size = size,
            count = self.commands.len() + 1,
            "undo push"
        );
        self.commands.push_back(command);
        self.index = self.count_isize() - 1;
        self.index_listeners.notify(&self.index);
        Ok(())
    }

    /// Revert the command at the current index.
    ///
    /// No-op while composing or when nothing can be undone.
    ///
    /// # Errors
    ///
    /// [`UndoError::Command`] if the command fails. The index has already
    /// moved back by then and listeners have been told.
    pub fn undo(&mut self) -> Result<()> {
        let prev = self.index;
        let result = self.undo_step();
        self.notify_if_moved(prev);
        result.map(|_| ())
    }

    /// Re-apply the command after the current index.
    ///
    /// No-op while composing or when nothing can be redone.
    ///
    /// # Errors
    ///
    /// [`UndoError::Command`] if the command fails. The index has already
    /// moved forward by then and listeners have been told.
    pub fn redo(&mut self) -> Result<()> {
        let prev = self.index;
        let result = self.redo_step();
        self.notify_if_moved(prev);
        result.map(|_| ())
    }

    /// Undo or redo until the index equals `value`.
    ///
    /// `value == count` moves as far forward as possible. Listeners receive a
    /// single notification for the net change.
    ///
    /// # Errors
    ///
    /// - [`UndoError::ComposingViolation`] while a macro is open
    /// - [`UndoError::InvalidIndex`] if `value < 0` or `value > count`
    /// - [`UndoError::Command`] if a step fails; the index stays where the
    ///   failing step left it
    pub fn set_index(&mut self, value: isize) -> Result<()> {
        if self.is_composing() {
            return Err(UndoError::ComposingViolation);
        }
        if value == self.index {
            return Ok(());
        }
        if value < 0 || value > self.count_isize() {
            return Err(UndoError::InvalidIndex {
                index: value,
                count: self.commands.len(),
            });
        }

        let prev = self.index;
        let mut result = Ok(());
        while self.index != value {
            let step = if value < self.index {
                self.undo_step()
            } else {
                self.redo_step()
            };
            match step {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        debug!(from = prev, to = self.index, target = value, "undo set index");
        self.notify_if_moved(prev);
        result
    }

    /// Flush every command and reset the stack, including open macros.
    pub fn clear(&mut self) {
        // Open macros hold commands that never reached the history.
        for mut open in self.macro_stack.drain(..).rev() {
            open.on_flush();
        }

        let was_clean = self.is_clean();
        if !self.commands.is_empty() {
            debug!(count = self.commands.len(), "undo clear");
            for cmd in self.commands.iter_mut().rev() {
                cmd.on_flush();
            }
            self.commands.clear();
            self.index = -1;
            self.index_listeners.notify(&self.index);
        }

        self.clean_state = CLEAN_UNSET;
        if !was_clean {
            self.clean_listeners.notify(&());
        }
    }

    /// Mark the current position as clean (e.g., after saving).
    pub fn set_clean(&mut self) {
        if self.is_clean() {
            return;
        }
        self.clean_state = self.index;
        debug!(clean_index = self.clean_state, "undo set clean");
        self.clean_listeners.notify(&());
    }

    /// Forget the clean mark.
    pub fn reset_clean(&mut self) {
        if self.clean_state == CLEAN_UNSET {
            return;
        }
        self.clean_state = CLEAN_UNSET;
        debug!("undo reset clean");
        self.clean_listeners.notify(&());
    }

    // ========================================================================
    // Macros
    // ========================================================================

    /// Open a macro. Subsequent pushes go into it until [`end_macro`](Self::end_macro).
    ///
    /// Macros nest; undo and redo are disabled until every macro is closed.
    pub fn begin_macro(&mut self, name: impl Into<String>) {
        let open = MacroCommand::new(name);
        debug!(name = open.name(), depth = self.macro_stack.len() + 1, "undo begin macro");
        self.macro_stack.push(open);
    }

    /// Close the innermost macro and push it as one command.
    ///
    /// A nested macro lands in its parent; an outermost one lands in the
    /// history.
    ///
    /// # Errors
    ///
    /// - [`UndoError::UnbalancedMacro`] if no macro is open
    /// - [`UndoError::CapacityExceeded`] if the finished macro does not fit;
    ///   the macro stays open
    pub fn end_macro(&mut self) -> Result<()> {
        let Some(open) = self.macro_stack.last() else {
            return Err(UndoError::UnbalancedMacro);
        };
        self.check_fits(open.memory_size())?;

        let Some(finished) = self.macro_stack.pop() else {
            return Err(UndoError::UnbalancedMacro);
        };
        debug!(
            name = finished.name(),
            children = finished.len(),
            depth = self.macro_stack.len(),
            "undo end macro"
        );
        self.push(Box::new(finished))
    }

    // ========================================================================
    // Merging
    // ========================================================================

    /// Ask the last command to absorb `command`.
    ///
    /// Only attempted when no macro is open and nothing can be redone. On
    /// success `command` is marked obsolete and should be dropped instead of
    /// pushed. A merge into the clean entry resets the clean mark, and the
    /// oldest entries are evicted if the merged entry grew past the budget.
    ///
    /// If the merged entry alone no longer fits the undo limit, it is
    /// evicted as well and the history ends up empty. Its effect stays
    /// applied; it just can no longer be undone.
    pub fn try_merge_last(&mut self, command: &mut dyn UndoCommand) -> bool {
        if self.is_composing() || self.commands.is_empty() || self.can_redo() {
            return false;
        }
        let last = self.commands.len() - 1;
        let mut others = self
            .memory_size()
            .saturating_sub(self.commands[last].memory_size());
        if !self.commands[last].merge_with(command) {
            return false;
        }
        command.set_obsolete(true);
        debug!(
            into = self.commands[last].name(),
            merged = command.name(),
            "undo merge"
        );

        if self.clean_state == self.index {
            self.reset_clean();
        }

        let prev = self.index;
        let limit = self.config.undo_limit;
        let merged = self.commands[last].memory_size();
        while others.checked_add(merged).is_none_or(|t| t > limit) && self.commands.len() > 1 {
            others = others.saturating_sub(self.evict_oldest());
        }
        if merged > limit {
            warn!(
                memory_size = merged,
                undo_limit = limit,
                "merged command too big for undo stack"
            );
            self.evict_oldest();
        }
        self.notify_if_moved(prev);
        true
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn count_isize(&self) -> isize {
        self.commands.len() as isize
    }

    fn check_fits(&self, size: u64) -> Result<()> {
        if size > self.config.undo_limit {
            warn!(
                memory_size = size,
                undo_limit = self.config.undo_limit,
                "command too big for undo stack"
            );
            return Err(UndoError::CapacityExceeded {
                size,
                limit: self.config.undo_limit,
            });
        }
        Ok(())
    }

    /// Flush and drop every entry after the index, newest first.
    fn truncate_redo_tail(&mut self) {
        let keep = (self.index + 1) as usize;
        if keep >= self.commands.len() {
            return;
        }
        debug!(dropped = self.commands.len() - keep, index = self.index, "undo truncate");
        while self.commands.len() > keep {
            if let Some(mut cmd) = self.commands.pop_back() {
                cmd.on_flush();
            }
        }
        if self.clean_state > self.index {
            self.clean_state = CLEAN_UNSET;
        }
    }

    /// Flush and drop the oldest entry, shifting the index and clean mark.
    ///
    /// Returns the memory size released, `0` when the history is empty.
    fn evict_oldest(&mut self) -> u64 {
        let Some(mut cmd) = self.commands.pop_front() else {
            return 0;
        };
        let size = cmd.memory_size();
        debug!(name = cmd.name(), memory_size = size, "undo evict");
        cmd.on_flush();
        self.index -= 1;
        self.clean_state = (self.clean_state - 1).max(CLEAN_UNSET);
        size
    }

    /// One undo step without notification. `Ok(false)` when nothing moved.
    fn undo_step(&mut self) -> Result<bool> {
        if self.commands.is_empty() || self.is_composing() || self.index < 0 {
            return Ok(false);
        }
        let at = self.index as usize;
        self.index -= 1;
        trace!(name = self.commands[at].name(), index = self.index, "undo step");
        self.commands[at]
            .undo()
            .map_err(|e| self.command_failed("undo", at, e))?;
        Ok(true)
    }

    /// One redo step without notification. `Ok(false)` when nothing moved.
    fn redo_step(&mut self) -> Result<bool> {
        if self.commands.is_empty() || self.is_composing() || self.index >= self.count_isize() - 1
        {
            return Ok(false);
        }
        self.index += 1;
        let at = self.index as usize;
        trace!(name = self.commands[at].name(), index = self.index, "redo step");
        self.commands[at]
            .redo()
            .map_err(|e| self.command_failed("redo", at, e))?;
        Ok(true)
    }

    fn command_failed(&self, op: &'static str, at: usize, error: CommandError) -> UndoError {
        warn!(
            op,
            name = self.commands[at].name(),
            index = self.index,
            %error,
            "command failed; history may be inconsistent"
        );
        UndoError::Command(error)
    }

    fn notify_if_moved(&mut self, prev: isize) {
        if self.index != prev {
            self.index_listeners.notify(&self.index);
        }
    }
}
