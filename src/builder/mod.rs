//! Builder API for ergonomic machine construction.
//!
//! Machines can be assembled call by call through [`Machine`](crate::Machine)
//! itself; the builder collects a whole definition first and validates it in
//! one pass before wiring anything.

pub mod error;
pub mod machine;
pub mod transition;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use transition::{TransitionBuilder, TransitionSpec};

/// Create an unconditional transition declaration.
///
/// # Example
///
/// ```
/// use hfsm::builder::simple_transition;
/// use hfsm::ENTER;
///
/// let spec = simple_transition::<()>(ENTER, "idle");
/// assert!(spec.guard.is_none());
/// ```
pub fn simple_transition<C>(from: impl Into<String>, to: impl Into<String>) -> TransitionSpec<C> {
    TransitionSpec::new(from, to)
}

/// Create a transition declaration with a guard predicate.
///
/// # Example
///
/// ```
/// use hfsm::builder::guarded_transition;
///
/// let spec = guarded_transition("idle", "alert", |noise: &u8| *noise > 5);
/// assert!(spec.guard.unwrap().check(&9));
/// ```
pub fn guarded_transition<C, F>(
    from: impl Into<String>,
    to: impl Into<String>,
    guard: F,
) -> TransitionSpec<C>
where
    F: Fn(&C) -> bool + 'static,
{
    TransitionSpec::guarded(from, to, guard)
}
