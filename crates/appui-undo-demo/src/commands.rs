#![forbid(unsafe_code)]

//! Undoable edits of the demo [`Store`](crate::store::Store).
//!
//! Each command remembers the value before and after the edit and dispatches
//! the matching action on undo/redo. Commands are captured before the edit
//! reaches the store; the caller dispatches [`SetColorCmd::action`] /
//! [`SetTextCmd::action`] once the stack accepted the command. The store
//! reference is released on flush, after which undo and redo report
//! [`CommandError::TargetNotFound`].

use std::any::Any;

use appui_undo::{CommandError, CommandMetadata, CommandResult, UndoCommand};

use crate::store::{Action, Color, SharedStore};

/// Fixed cost charged for every store edit.
pub const EDIT_MEMORY_SIZE: u64 = 16;

fn color_name(color: Color) -> String {
    format!("Set Color {color}")
}

fn text_name(text: &str) -> String {
    format!("Set Text '{text}'")
}

fn dispatch(store: Option<&SharedStore>, action: Action) -> CommandResult {
    let store = store.ok_or_else(|| CommandError::TargetNotFound("store".to_string()))?;
    store.borrow_mut().dispatch(action);
    Ok(())
}

// ============================================================================
// SetColorCmd
// ============================================================================

/// Changes the state color.
pub struct SetColorCmd {
    metadata: CommandMetadata,
    before: Color,
    after: Color,
    store: Option<SharedStore>,
}

impl SetColorCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, before: Color, after: Color, store: SharedStore) -> Self {
        Self {
            metadata: CommandMetadata::new(name),
            before,
            after,
            store: Some(store),
        }
    }

    /// Record a change from the store's current color to `color`. The store
    /// is left untouched.
    #[must_use]
    pub fn capture(store: &SharedStore, color: Color) -> Self {
        let before = store.borrow().state().color;
        Self::new(color_name(color), before, color, store.clone())
    }

    /// Action applying the new color.
    #[must_use]
    pub fn action(&self) -> Action {
        Action::SetColor(self.after)
    }

    #[must_use]
    pub fn before(&self) -> Color {
        self.before
    }

    #[must_use]
    pub fn after(&self) -> Color {
        self.after
    }
}

impl UndoCommand for SetColorCmd {
    fn id(&self) -> &str {
        "app/SetColor"
    }

    fn memory_size(&self) -> u64 {
        EDIT_MEMORY_SIZE
    }

    fn undo(&mut self) -> CommandResult {
        dispatch(self.store.as_ref(), Action::SetColor(self.before))
    }

    fn redo(&mut self) -> CommandResult {
        dispatch(self.store.as_ref(), Action::SetColor(self.after))
    }

    fn on_flush(&mut self) {
        self.store = None;
    }

    fn merge_with(&mut self, other: &dyn UndoCommand) -> bool {
        match other.as_any().downcast_ref::<Self>() {
            Some(other) => {
                self.after = other.after;
                self.metadata.rename(color_name(self.after));
                true
            }
            None => false,
        }
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
        "SetColorCmd"
    }
}

// ============================================================================
// SetTextCmd
// ============================================================================

/// Replaces the state text.
pub struct SetTextCmd {
    metadata: CommandMetadata,
    before: String,
    after: String,
    store: Option<SharedStore>,
}

impl SetTextCmd {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
        store: SharedStore,
    ) -> Self {
        Self {
            metadata: CommandMetadata::new(name),
            before: before.into(),
            after: after.into(),
            store: Some(store),
        }
    }

    /// Record a change from the store's current text to `text`. The store
    /// is left untouched.
    #[must_use]
    pub fn capture(store: &SharedStore, text: &str) -> Self {
        let before = store.borrow().state().text.clone();
        Self::new(text_name(text), before, text, store.clone())
    }

    /// Action applying the new text.
    #[must_use]
    pub fn action(&self) -> Action {
        Action::SetText(self.after.clone())
    }

    #[must_use]
    pub fn before(&self) -> &str {
        &self.before
    }

    #[must_use]
    pub fn after(&self) -> &str {
        &self.after
    }
}

impl UndoCommand for SetTextCmd {
    fn id(&self) -> &str {
        "app/SetText"
    }

    fn memory_size(&self) -> u64 {
        EDIT_MEMORY_SIZE
    }

    fn undo(&mut self) -> CommandResult {
        dispatch(self.store.as_ref(), Action::SetText(self.before.clone()))
    }

    fn redo(&mut self) -> CommandResult {
        dispatch(self.store.as_ref(), Action::SetText(self.after.clone()))
    }

    fn on_flush(&mut self) {
        self.store = None;
    }

    fn merge_with(&mut self, other: &dyn UndoCommand) -> bool {
        match other.as_any().downcast_ref::<Self>() {
            Some(other) => {
                self.after.clone_from(&other.after);
                self.metadata.rename(text_name(&self.after));
                true
            }
            None => false,
        }
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
        "SetTextCmd"
    }
}
