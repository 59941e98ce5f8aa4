//! Guard predicates for controlling state transitions.
//!
//! Guards are boolean functions over the shared context that decide whether
//! a transition fires. They only read the context.

use std::fmt;
use std::rc::Rc;

/// Predicate over the shared context that gates a transition.
///
/// A transition without a guard always fires. Guards are cheap to clone, so
/// one guard can gate several transitions.
///
/// # Example
///
/// ```rust
/// use hfsm::Guard;
///
/// struct Sensors {
///     enemy_visible: bool,
/// }
///
/// let sees_enemy = Guard::new(|s: &Sensors| s.enemy_visible);
///
/// assert!(sees_enemy.check(&Sensors { enemy_visible: true }));
/// assert!(!sees_enemy.check(&Sensors { enemy_visible: false }));
/// ```
pub struct Guard<C> {
    predicate: Rc<dyn Fn(&C) -> bool>,
}

impl<C> Guard<C> {
    /// Create a guard from a predicate.
    ///
    /// The predicate should be free of side effects: it may be evaluated any
    /// number of times per tick while chained transitions settle.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + 'static,
    {
        Guard {
            predicate: Rc::new(predicate),
        }
    }

    /// Evaluate the guard against the context.
    pub fn check(&self, context: &C) -> bool {
        (self.predicate)(context)
    }
}

impl<C> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Self {
            predicate: Rc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}
