//! Errors reported by machine operations.

use thiserror::Error;

/// Errors that can occur when wiring or driving a machine.
///
/// None of these are fatal: an operation that fails has no effect on the
/// machine, and the same error is reported to the machine's
/// [`DiagnosticSink`](crate::DiagnosticSink).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HfsmError {
    #[error("Unknown state '{name}'")]
    UnknownState { name: String },

    #[error("Transition '{from}' -> '{to}' already exists")]
    DuplicateTransition { from: String, to: String },

    #[error("No transition '{from}' -> '{to}' to remove")]
    MissingTransition { from: String, to: String },

    #[error("State handle does not belong to machine '{machine}'")]
    UnownedState { machine: String },

    #[error("'{name}' is a reserved state name")]
    ReservedName { name: String },

    #[error("Transitions in machine '{machine}' did not settle within {limit} changes")]
    SettleLimitExceeded { machine: String, limit: usize },

    #[error("Machine '{machine}' has no context to drive its states with")]
    MissingContext { machine: String },

    #[error("Machine '{machine}' is nested and not selected by its parent")]
    InactiveMachine { machine: String },
}
