//! Build errors for machine and transition builders.

use crate::error::HfsmError;
use crate::validation::Violation;
use thiserror::Error;

/// Errors that can occur when building machines and transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Transition source state not specified. Call .from(name)")]
    MissingFromState,

    #[error("Transition target state not specified. Call .to(name)")]
    MissingToState,

    #[error("Machine definition has {} problem(s), first: {}", .0.len(), first_violation(.0))]
    Invalid(Vec<Violation>),

    #[error(transparent)]
    Wiring(#[from] HfsmError),
}

impl BuildError {
    /// Violations found while validating the definition, if that is what
    /// failed.
    pub fn violations(&self) -> &[Violation] {
        match self {
            BuildError::Invalid(violations) => violations,
            _ => &[],
        }
    }
}

pub(crate) fn first_violation(violations: &[Violation]) -> String {
    violations
        .first()
        .map_or_else(String::new, ToString::to_string)
}
