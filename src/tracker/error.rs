//! Errors raised by the built-in habit handlers.

use thiserror::Error;

use super::habits::Habit;

/// Failure of a habit command.
///
/// The dispatcher turns any of these into a command-error event; they never
/// reach the caller of `accept`.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A food habit was sent without an item.
    #[error("missing item for {habit}")]
    MissingArgument { habit: Habit },

    /// The item store failed.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
