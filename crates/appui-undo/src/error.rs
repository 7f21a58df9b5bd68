#![forbid(unsafe_code)]

use thiserror::Error;

use crate::command::CommandError;

pub type Result<T> = std::result::Result<T, UndoError>;

/// Contract violations reported by [`UndoStack`](crate::UndoStack).
///
/// A failed `push` or `end_macro` leaves the stack exactly as it was.
/// [`UndoError::Command`] is the exception: the index has already moved
/// when a command fails, and the history should be treated as corrupted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UndoError {
    #[error("command of size {size} does not fit in an undo limit of {limit}")]
    CapacityExceeded { size: u64, limit: u64 },

    #[error("index {index} out of range for a history of {count} commands")]
    InvalidIndex { index: isize, count: usize },

    #[error("cannot set the index while a macro is being composed")]
    ComposingViolation,

    #[error("cannot end macro: no macro is being composed")]
    UnbalancedMacro,

    #[error("command failed: {0}")]
    Command(#[from] CommandError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_message_names_both_sizes() {
        let error = UndoError::CapacityExceeded { size: 5, limit: 2 };
        assert_eq!(
            error.to_string(),
            "command of size 5 does not fit in an undo limit of 2"
        );
    }

    #[test]
    fn command_error_converts() {
        let error: UndoError = CommandError::Other("boom".into()).into();
        assert_eq!(error, UndoError::Command(CommandError::Other("boom".into())));
        assert_eq!(error.to_string(), "command failed: boom");
    }
}
