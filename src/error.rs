//! Error types for countdown operations

use thiserror::Error;

use crate::state::TimerStatus;

/// Result type alias for countdown operations
pub type Result<T> = std::result::Result<T, TimerError>;

/// Contract violations reported by the countdown state machine.
///
/// Neither variant is retryable: the caller asked for something the current
/// state does not allow, or supplied a value outside the accepted range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimerError {
    #[error("cannot {operation} while {status}")]
    InvalidStateTransition {
        operation: &'static str,
        status: TimerStatus,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl TimerError {
    pub(crate) fn transition(operation: &'static str, status: TimerStatus) -> Self {
        Self::InvalidStateTransition { operation, status }
    }
}
