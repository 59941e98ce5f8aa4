//! Overridable lifecycle hooks.
//!
//! Every state carries a [`Behavior`]. The runtime calls into it when the
//! state is entered, ticked, or exited. All three hooks default to no-ops, so
//! an implementation only overrides what it needs.

use std::fmt;
use std::time::Duration;

/// Lifecycle hooks of a state.
///
/// # Example
///
/// ```rust
/// use hfsm::{Behavior, Machine, State};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Stamina {
///     value: f32,
/// }
///
/// struct Resting;
///
/// impl Behavior<Stamina> for Resting {
///     fn on_update(&mut self, dt: Duration, ctx: &mut Stamina) {
///         ctx.value += dt.as_secs_f32();
///     }
/// }
///
/// let mut machine = Machine::new("player", Stamina::default());
/// machine.add_state(State::with_behavior("rest", Resting)).unwrap();
/// machine.change_to_state("rest").unwrap();
/// machine.update(Duration::from_secs(2)).unwrap();
///
/// assert_eq!(machine.context().unwrap().value, 2.0);
/// ```
pub trait Behavior<C> {
    /// Called once when the state becomes current. `previous` is the name of
    /// the state that was current before.
    fn on_enter(&mut self, _previous: &str, _ctx: &mut C) {}

    /// Called once per tick while the state is current and none of its
    /// transitions fired.
    fn on_update(&mut self, _dt: Duration, _ctx: &mut C) {}

    /// Called once when the state stops being current, before the successor
    /// is entered.
    fn on_exit(&mut self, _next: &str, _ctx: &mut C) {}
}

/// Behavior that does nothing. Used by states created without hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBehavior;

impl<C> Behavior<C> for NoopBehavior {}

impl<C, B: Behavior<C> + ?Sized> Behavior<C> for Box<B> {
    fn on_enter(&mut self, previous: &str, ctx: &mut C) {
        (**self).on_enter(previous, ctx)
    }

    fn on_update(&mut self, dt: Duration, ctx: &mut C) {
        (**self).on_update(dt, ctx)
    }

    fn on_exit(&mut self, next: &str, ctx: &mut C) {
        (**self).on_exit(next, ctx)
    }
}

type EnterHook<C> = Box<dyn FnMut(&str, &mut C)>;
type UpdateHook<C> = Box<dyn FnMut(Duration, &mut C)>;
type ExitHook<C> = Box<dyn FnMut(&str, &mut C)>;

/// Behavior assembled from optional closures, one per hook.
///
/// ```rust
/// use hfsm::Callbacks;
///
/// let hooks = Callbacks::<Vec<String>>::new()
///     .on_enter(|prev, log| log.push(format!("entered from {prev}")))
///     .on_exit(|next, log| log.push(format!("leaving for {next}")));
/// ```
pub struct Callbacks<C> {
    enter: Option<EnterHook<C>>,
    update: Option<UpdateHook<C>>,
    exit: Option<ExitHook<C>>,
}

impl<C> Callbacks<C> {
    /// Create a set of callbacks with every hook unset.
    pub fn new() -> Self {
        Self {
            enter: None,
            update: None,
            exit: None,
        }
    }

    /// Set the enter hook.
    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&str, &mut C) + 'static,
    {
        self.enter = Some(Box::new(hook));
        self
    }

    /// Set the update hook.
    pub fn on_update<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Duration, &mut C) + 'static,
    {
        self.update = Some(Box::new(hook));
        self
    }

    /// Set the exit hook.
    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&str, &mut C) + 'static,
    {
        self.exit = Some(Box::new(hook));
        self
    }

    /// True when no hook is set.
    pub fn is_empty(&self) -> bool {
        self.enter.is_none() && self.update.is_none() && self.exit.is_none()
    }
}

impl<C> Default for Callbacks<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Callbacks<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_enter", &self.enter.is_some())
            .field("on_update", &self.update.is_some())
            .field("on_exit", &self.exit.is_some())
            .finish()
    }
}

impl<C> Behavior<C> for Callbacks<C> {
    fn on_enter(&mut self, previous: &str, ctx: &mut C) {
        if let Some(hook) = self.enter.as_mut() {
            hook(previous, ctx);
        }
    }

    fn on_update(&mut self, dt: Duration, ctx: &mut C) {
        if let Some(hook) = self.update.as_mut() {
            hook(dt, ctx);
        }
    }

    fn on_exit(&mut self, next: &str, ctx: &mut C) {
        if let Some(hook) = self.exit.as_mut() {
            hook(next, ctx);
        }
    }
}
