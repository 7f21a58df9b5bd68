#![forbid(unsafe_code)]

//! Property tests for [`UndoStack`] invariants.
//!
//! Validates:
//! - `-1 <= index < count` after every operation.
//! - `can_undo`/`can_redo` match the index and are false while composing.
//! - The memory budget holds after every successful push.
//! - Oversized pushes fail without touching the history.
//! - Applied state always equals the prefix of the history up to the index.
//! - Every command is flushed at most once, and only after leaving the stack.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use appui_undo::{
    CommandMetadata, CommandResult, UndoCommand, UndoConfig, UndoError, UndoStack,
};
use proptest::prelude::*;

// ============================================================================
// Model command
// ============================================================================

/// Adds `delta` to a shared counter; tracks flushes by serial number.
struct AddCmd {
    metadata: CommandMetadata,
    serial: u64,
    delta: i64,
    size: u64,
    counter: Rc<Cell<i64>>,
    flushed: Rc<RefCell<Vec<u64>>>,
}

impl UndoCommand for AddCmd {
    fn id(&self) -> &str {
        "add"
    }

    fn memory_size(&self) -> u64 {
        self.size
    }

    fn undo(&mut self) -> CommandResult {
        self.counter.set(self.counter.get() - self.delta);
        Ok(())
    }

    fn redo(&mut self) -> CommandResult {
        self.counter.set(self.counter.get() + self.delta);
        Ok(())
    }

    fn on_flush(&mut self) {
        self.flushed.borrow_mut().push(self.serial);
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
}

struct Harness {
    stack: UndoStack,
    counter: Rc<Cell<i64>>,
    flushed: Rc<RefCell<Vec<u64>>>,
    next_serial: u64,
}

impl Harness {
    fn new(limit: u64) -> Self {
        Self {
            stack: UndoStack::with_config(UndoConfig::new(limit)),
            counter: Rc::new(Cell::new(0)),
            flushed: Rc::new(RefCell::new(Vec::new())),
            next_serial: 0,
        }
    }

    /// Apply `delta` to the counter and push the command recording it.
    fn push(&mut self, delta: i64, size: u64) -> Result<(), UndoError> {
        self.next_serial += 1;
        let cmd = AddCmd {
            metadata: CommandMetadata::new(format!("add {delta}")),
            serial: self.next_serial,
            delta,
            size,
            counter: self.counter.clone(),
            flushed: self.flushed.clone(),
        };
        let result = self.stack.push(Box::new(cmd));
        if result.is_ok() {
            self.counter.set(self.counter.get() + delta);
        }
        result
    }

    fn check_structural(&self) -> Result<(), TestCaseError> {
        let count = self.stack.count() as isize;
        let index = self.stack.index();
        prop_assert!(index >= -1, "index {} below -1", index);
        prop_assert!(index < count, "index {} not below count {}", index, count);
        if self.stack.is_composing() {
            prop_assert!(!self.stack.can_undo());
            prop_assert!(!self.stack.can_redo());
        } else {
            prop_assert_eq!(self.stack.can_undo(), index >= 0);
            prop_assert_eq!(self.stack.can_redo(), index < count - 1);
        }
        prop_assert!(self.stack.memory_size() <= self.stack.undo_limit());
        Ok(())
    }
}

// ============================================================================
// Strategy helpers
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Push(i64, u64),
    Undo,
    Redo,
    SetIndex(isize),
    SetClean,
    BeginMacro,
    EndMacro,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (-100i64..100, 0u64..6).prop_map(|(d, s)| Op::Push(d, s)),
        2 => Just(Op::Undo),
        2 => Just(Op::Redo),
        1 => (-2isize..12).prop_map(Op::SetIndex),
        1 => Just(Op::SetClean),
        1 => Just(Op::BeginMacro),
        1 => Just(Op::EndMacro),
    ]
}

fn ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..=max_len)
}

// ============================================================================
// Invariant 1: structural bounds hold after every operation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn structural_invariants_hold(
        limit in 1u64..20,
        ops in ops_strategy(80)
    ) {
        let mut h = Harness::new(limit);
        for op in ops {
            match op {
                Op::Push(delta, size) => {
                    let before = h.stack.count();
                    if let Err(e) = h.push(delta, size) {
                        prop_assert!(size > limit);
                        prop_assert_eq!(e, UndoError::CapacityExceeded { size, limit });
                        prop_assert_eq!(h.stack.count(), before);
                    }
                }
                Op::Undo => h.stack.undo().unwrap(),
                Op::Redo => h.stack.redo().unwrap(),
                Op::SetIndex(i) => {
                    let composing = h.stack.is_composing();
                    match h.stack.set_index(i) {
                        Ok(()) => {}
                        Err(UndoError::ComposingViolation) => prop_assert!(composing),
                        Err(UndoError::InvalidIndex { .. }) => {
                            prop_assert!(i < 0 || i > h.stack.count() as isize);
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                Op::SetClean => {
                    h.stack.set_clean();
                    prop_assert!(h.stack.is_clean());
                }
                Op::BeginMacro => h.stack.begin_macro("macro"),
                Op::EndMacro => {
                    let depth = h.stack.macro_depth();
                    match h.stack.end_macro() {
                        Ok(()) => prop_assert_eq!(h.stack.macro_depth(), depth - 1),
                        Err(UndoError::UnbalancedMacro) => prop_assert_eq!(depth, 0),
                        Err(UndoError::CapacityExceeded { .. }) => {
                            prop_assert_eq!(h.stack.macro_depth(), depth);
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
            }
            h.check_structural()?;
        }
    }
}

// ============================================================================
// Invariant 2: applied state equals the history prefix (no eviction)
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn counter_matches_applied_prefix(ops in ops_strategy(60)) {
        let mut h = Harness::new(u64::MAX);
        let mut deltas: Vec<i64> = Vec::new();
        let mut pending_macro: Vec<Vec<i64>> = Vec::new();

        for op in ops {
            match op {
                Op::Push(delta, size) => {
                    h.push(delta, size).unwrap();
                    if let Some(open) = pending_macro.last_mut() {
                        open.push(delta);
                    } else {
                        deltas.truncate((h.stack.index()) as usize);
                        deltas.push(delta);
                    }
                }
                Op::Undo => h.stack.undo().unwrap(),
                Op::Redo => h.stack.redo().unwrap(),
                Op::SetIndex(i) => {
                    let _ = h.stack.set_index(i);
                }
                Op::SetClean => h.stack.set_clean(),
                Op::BeginMacro => {
                    h.stack.begin_macro("macro");
                    pending_macro.push(Vec::new());
                }
                Op::EndMacro => {
                    if h.stack.end_macro().is_ok() {
                        let finished = pending_macro.pop().unwrap();
                        let sum: i64 = finished.iter().sum();
                        if let Some(outer) = pending_macro.last_mut() {
                            outer.push(sum);
                        } else {
                            deltas.truncate(h.stack.index() as usize);
                            deltas.push(sum);
                        }
                    }
                }
            }

            prop_assert_eq!(deltas.len(), h.stack.count());
            let applied: i64 = deltas[..(h.stack.index() + 1) as usize].iter().sum();
            let composing: i64 = pending_macro.iter().flatten().sum();
            prop_assert_eq!(h.counter.get(), applied + composing);
        }
    }
}

// ============================================================================
// Invariant 3: push N then undo N returns to -1
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn push_then_undo_all(n in 1usize..40) {
        let mut h = Harness::new(u64::MAX);
        for i in 0..n {
            h.push(i as i64, 1).unwrap();
        }
        for _ in 0..n {
            h.stack.undo().unwrap();
        }
        prop_assert_eq!(h.stack.index(), -1);
        prop_assert!(!h.stack.can_undo());
        prop_assert_eq!(h.counter.get(), 0);
    }
}

// ============================================================================
// Invariant 4: flush happens once, only for commands that left the stack
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn flushed_commands_are_gone_and_unique(
        limit in 1u64..10,
        ops in ops_strategy(60)
    ) {
        let mut h = Harness::new(limit);
        for op in ops {
            match op {
                Op::Push(delta, size) => {
                    let _ = h.push(delta, size.min(limit));
                }
                Op::Undo => h.stack.undo().unwrap(),
                Op::Redo => h.stack.redo().unwrap(),
                Op::SetIndex(i) => {
                    let _ = h.stack.set_index(i);
                }
                Op::SetClean => h.stack.set_clean(),
                // Macros are covered elsewhere; keep every command top-level.
                Op::BeginMacro | Op::EndMacro => {}
            }
        }

        let flushed = h.flushed.borrow();
        let unique: HashSet<u64> = flushed.iter().copied().collect();
        prop_assert_eq!(unique.len(), flushed.len(), "command flushed twice");

        let alive = h.stack.count();
        prop_assert_eq!(alive + flushed.len(), h.next_serial as usize);

        drop(flushed);
        h.stack.clear();
        prop_assert_eq!(h.flushed.borrow().len(), h.next_serial as usize);
    }
}

// ============================================================================
// Invariant 5: clean state follows the marked index
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn clean_returns_when_index_returns(
        n in 1usize..20,
        back in 0usize..20
    ) {
        let mut h = Harness::new(u64::MAX);
        for _ in 0..n {
            h.push(1, 1).unwrap();
        }
        h.stack.set_clean();
        let marked = h.stack.index();

        let steps = back.min(n);
        for _ in 0..steps {
            h.stack.undo().unwrap();
        }
        prop_assert_eq!(h.stack.is_clean(), steps == 0);

        h.stack.set_index(marked).unwrap();
        prop_assert!(h.stack.is_clean());

        h.push(1, 1).unwrap();
        prop_assert!(!h.stack.is_clean());
    }
}
