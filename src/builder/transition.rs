//! Builder for transition declarations.

use crate::builder::error::BuildError;
use crate::core::Guard;
use std::fmt;

/// A transition declared by state names, resolved when the machine is built.
pub struct TransitionSpec<C> {
    pub from: String,
    pub to: String,
    pub guard: Option<Guard<C>>,
}

impl<C> TransitionSpec<C> {
    /// An unconditional transition.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            guard: None,
        }
    }

    /// A transition that fires only when `predicate` holds.
    pub fn guarded<F>(from: impl Into<String>, to: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + 'static,
    {
        Self {
            from: from.into(),
            to: to.into(),
            guard: Some(Guard::new(predicate)),
        }
    }
}

impl<C> Clone for TransitionSpec<C> {
    fn clone(&self) -> Self {
        Self {
            from: self.from.clone(),
            to: self.to.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<C> fmt::Debug for TransitionSpec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionSpec")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

/// Fluent builder for a [`TransitionSpec`].
pub struct TransitionBuilder<C> {
    from: Option<String>,
    to: Option<String>,
    guard: Option<Guard<C>>,
}

impl<C> TransitionBuilder<C> {
    pub fn new() -> Self {
        Self {
            from: None,
            to: None,
            guard: None,
        }
    }

    /// Set the source state (required).
    pub fn from(mut self, name: impl Into<String>) -> Self {
        self.from = Some(name.into());
        self
    }

    /// Set the target state (required).
    pub fn to(mut self, name: impl Into<String>) -> Self {
        self.to = Some(name.into());
        self
    }

    /// Add a guard.
    pub fn guard(mut self, guard: Guard<C>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    pub fn build(self) -> Result<TransitionSpec<C>, BuildError> {
        let from = self.from.ok_or(BuildError::MissingFromState)?;
        let to = self.to.ok_or(BuildError::MissingToState)?;

        Ok(TransitionSpec {
            from,
            to,
            guard: self.guard,
        })
    }
}

impl<C> Default for TransitionBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
