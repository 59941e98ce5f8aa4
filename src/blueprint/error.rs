//! Blueprint error types.

use crate::builder::error::first_violation;
use crate::error::HfsmError;
use crate::validation::Violation;
use thiserror::Error;

/// Errors that can occur while loading or instantiating a blueprint.
#[derive(Debug, Error)]
pub enum BlueprintError {
    /// The input is not a well-formed blueprint document
    #[error("Blueprint parsing failed: {0}")]
    Parse(#[from] serde_json::Error),

    /// The blueprint was written by a newer format version
    #[error("Unsupported blueprint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The table itself is inconsistent
    #[error("Blueprint has {} problem(s), first: {}", .0.len(), first_violation(.0))]
    Invalid(Vec<Violation>),

    /// Wiring the validated table into a machine failed
    #[error(transparent)]
    Wiring(#[from] HfsmError),
}

impl BlueprintError {
    pub fn violations(&self) -> &[Violation] {
        match self {
            BlueprintError::Invalid(violations) => violations,
            _ => &[],
        }
    }
}
