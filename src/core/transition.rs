//! Directed edges between sibling states.

use super::guard::Guard;
use super::id::StateId;

/// An edge from one state to a sibling in the same machine.
///
/// Both ends are handles into the owning machine's table. A transition
/// without a guard always fires.
#[derive(Debug)]
pub struct Transition<C> {
    pub from: StateId,
    pub to: StateId,
    pub guard: Option<Guard<C>>,
}

impl<C> Transition<C> {
    pub(crate) fn new(from: StateId, to: StateId, guard: Option<Guard<C>>) -> Self {
        Self { from, to, guard }
    }

    /// Check whether this transition fires for the given context.
    pub fn fires(&self, context: &C) -> bool {
        self.guard.as_ref().is_none_or(|g| g.check(context))
    }

    /// True when the transition has no guard.
    pub fn is_unconditional(&self) -> bool {
        self.guard.is_none()
    }
}

impl<C> Clone for Transition<C> {
    fn clone(&self) -> Self {
        Self {
            from: self.from,
            to: self.to,
            guard: self.guard.clone(),
        }
    }
}
