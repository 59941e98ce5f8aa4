//! Whole-table checks for machine definitions.
//!
//! Definitions handed to the builder or loaded from a blueprint are checked
//! up front with `Validation`, so every problem is reported in one pass
//! instead of stopping at the first one.

use crate::machine::is_reserved;
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A problem found in a machine definition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Violation {
    #[error("State name '{name}' is reserved")]
    ReservedName { name: String },

    #[error("State '{name}' is declared more than once")]
    DuplicateState { name: String },

    #[error("Transition '{from}' -> '{to}' references unknown state '{missing}'")]
    UnknownEndpoint {
        from: String,
        to: String,
        missing: String,
    },

    #[error("Transition '{from}' -> '{to}' is declared more than once")]
    DuplicateTransition { from: String, to: String },

    #[error("Transition '{from}' -> '{to}' uses unregistered guard '{guard}'")]
    UnknownGuard {
        from: String,
        to: String,
        guard: String,
    },

    #[error("State '{state}' uses unregistered behavior '{behavior}'")]
    UnknownBehavior { state: String, behavior: String },
}

/// Outcome of a definition check: success, or every violation found.
pub type Checked = Validation<(), NonEmptyVec<Violation>>;

/// Check state names and transition endpoints of a single table.
///
/// Reserved names may appear as transition endpoints but not as declared
/// states.
pub(crate) fn check_table(states: &[&str], transitions: &[(&str, &str)]) -> Checked {
    let mut checks: Vec<Checked> = Vec::new();

    let mut declared = HashSet::new();
    for name in states {
        if is_reserved(name) {
            checks.push(Validation::fail(Violation::ReservedName {
                name: name.to_string(),
            }));
        } else if !declared.insert(*name) {
            checks.push(Validation::fail(Violation::DuplicateState {
                name: name.to_string(),
            }));
        }
    }

    let mut edges = HashSet::new();
    for (from, to) in transitions {
        for end in [from, to] {
            if !is_reserved(end) && !declared.contains(end) {
                checks.push(Validation::fail(Violation::UnknownEndpoint {
                    from: from.to_string(),
                    to: to.to_string(),
                    missing: end.to_string(),
                }));
            }
        }
        if !edges.insert((*from, *to)) {
            checks.push(Validation::fail(Violation::DuplicateTransition {
                from: from.to_string(),
                to: to.to_string(),
            }));
        }
    }

    combine(checks)
}

/// Accumulate all checks into one outcome.
pub(crate) fn combine(checks: Vec<Checked>) -> Checked {
    if checks.is_empty() {
        return Validation::success(());
    }
    Validation::all_vec(checks).map(|_| ())
}

pub(crate) fn into_result(checked: Checked) -> Result<(), Vec<Violation>> {
    match checked {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => Err(errors.iter().cloned().collect()),
    }
}
