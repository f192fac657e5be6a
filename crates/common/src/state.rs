//! Common state machine error types
//!
//! Shared by the project, curation and access-request state machines.

use crate::error::Error;
use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },

    #[error("Guard condition failed: {0}")]
    GuardFailed(String),

    #[error("Terminal state: {0} is a terminal state and cannot transition")]
    TerminalState(String),
}

impl From<StateError> for Error {
    fn from(err: StateError) -> Self {
        match err {
            StateError::InvalidTransition { from, event } => Error::InvalidState(format!(
                "cannot apply '{}' while in '{}'",
                event, from
            )),
            StateError::GuardFailed(msg) => Error::InvalidState(msg),
            StateError::TerminalState(state) => Error::InvalidState(format!(
                "'{}' is terminal and cannot transition",
                state
            )),
        }
    }
}
