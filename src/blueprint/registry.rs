//! Named guards and behaviors that blueprints refer to.

use crate::core::{Behavior, Guard};
use std::collections::HashMap;
use std::fmt;

type BehaviorFactory<C> = Box<dyn Fn() -> Box<dyn Behavior<C>>>;

/// Code a blueprint can reference by name.
///
/// A blueprint is plain data, so guard predicates and state hooks are
/// registered here under a name and looked up when the blueprint is
/// instantiated. Behaviors are registered as factories because every state
/// using one gets its own instance.
///
/// ```rust
/// use hfsm::{Callbacks, Registry};
///
/// struct Sensors {
///     noise: u32,
/// }
///
/// let registry = Registry::new()
///     .with_guard("loud", |s: &Sensors| s.noise > 10)
///     .with_behavior("listen", || Callbacks::new().on_update(|_, s: &mut Sensors| s.noise += 1));
///
/// assert!(registry.has_guard("loud"));
/// assert!(registry.has_behavior("listen"));
/// ```
pub struct Registry<C: 'static> {
    guards: HashMap<String, Guard<C>>,
    behaviors: HashMap<String, BehaviorFactory<C>>,
}

impl<C: 'static> Registry<C> {
    pub fn new() -> Self {
        Self {
            guards: HashMap::new(),
            behaviors: HashMap::new(),
        }
    }

    /// Register a guard predicate. A previous guard with the same name is
    /// replaced.
    pub fn with_guard<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + 'static,
    {
        self.register_guard(name, Guard::new(predicate));
        self
    }

    /// Register a behavior factory. A previous behavior with the same name
    /// is replaced.
    pub fn with_behavior<F, B>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> B + 'static,
        B: Behavior<C> + 'static,
    {
        self.register_behavior(name, factory);
        self
    }

    pub fn register_guard(&mut self, name: impl Into<String>, guard: Guard<C>) {
        self.guards.insert(name.into(), guard);
    }

    pub fn register_behavior<F, B>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> B + 'static,
        B: Behavior<C> + 'static,
    {
        self.behaviors.insert(
            name.into(),
            Box::new(move || Box::new(factory()) as Box<dyn Behavior<C>>),
        );
    }

    pub fn guard(&self, name: &str) -> Option<Guard<C>> {
        self.guards.get(name).cloned()
    }

    pub fn has_guard(&self, name: &str) -> bool {
        self.guards.contains_key(name)
    }

    /// Create a fresh instance of a registered behavior.
    pub fn behavior(&self, name: &str) -> Option<Box<dyn Behavior<C>>> {
        self.behaviors.get(name).map(|factory| factory())
    }

    pub fn has_behavior(&self, name: &str) -> bool {
        self.behaviors.contains_key(name)
    }
}

impl<C: 'static> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut guards: Vec<&str> = self.guards.keys().map(String::as_str).collect();
        let mut behaviors: Vec<&str> = self.behaviors.keys().map(String::as_str).collect();
        guards.sort_unstable();
        behaviors.sort_unstable();
        f.debug_struct("Registry")
            .field("guards", &guards)
            .field("behaviors", &behaviors)
            .finish()
    }
}
