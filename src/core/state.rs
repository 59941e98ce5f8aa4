//! Leaf states and their lifecycle.

use super::behavior::{Behavior, NoopBehavior};
use super::id::{MachineId, StateId};
use super::transition::Transition;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// A named node in a machine's state table.
///
/// A state owns its outgoing transitions (in evaluation order) and a
/// [`Behavior`] that receives the enter/update/exit hooks. Transitions are
/// wired through the owning [`Machine`](crate::Machine), which resolves
/// target names against its own table.
///
/// # Example
///
/// ```rust
/// use hfsm::{Callbacks, Machine, State};
///
/// let mut machine = Machine::new("door", 0u32);
/// let opened = State::with_behavior(
///     "open",
///     Callbacks::new().on_enter(|_, count: &mut u32| *count += 1),
/// );
///
/// machine.add_state(opened).unwrap();
/// machine.change_to_state("open").unwrap();
///
/// assert_eq!(machine.current_name(), "open");
/// assert_eq!(*machine.context().unwrap(), 1);
/// ```
pub struct State<C> {
    name: String,
    pub(crate) transitions: Vec<Transition<C>>,
    behavior: Box<dyn Behavior<C>>,
    pub(crate) owner: Option<MachineId>,
    entered_at: Option<DateTime<Utc>>,
}

impl<C: 'static> State<C> {
    /// Create a state with no hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_behavior(name, NoopBehavior)
    }

    /// Create a state driven by the given behavior.
    pub fn with_behavior(name: impl Into<String>, behavior: impl Behavior<C> + 'static) -> Self {
        Self {
            name: name.into(),
            transitions: Vec::new(),
            behavior: Box::new(behavior),
            owner: None,
            entered_at: None,
        }
    }
}

impl<C> State<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The machine whose table holds this state, if any.
    pub fn owner(&self) -> Option<MachineId> {
        self.owner
    }

    /// Outgoing transitions in evaluation order.
    pub fn transitions(&self) -> &[Transition<C>] {
        &self.transitions
    }

    /// When the state was last entered.
    pub fn entered_at(&self) -> Option<DateTime<Utc>> {
        self.entered_at
    }

    /// Time spent since the state was last entered.
    ///
    /// Advisory telemetry only. Keeps counting after the state is exited.
    pub fn duration(&self) -> Option<Duration> {
        self.entered_at.map(|at| {
            Utc::now()
                .signed_duration_since(at)
                .to_std()
                .unwrap_or(Duration::ZERO)
        })
    }

    pub(crate) fn set_behavior(&mut self, behavior: Box<dyn Behavior<C>>) {
        self.behavior = behavior;
    }

    pub(crate) fn enter(&mut self, previous: &str, ctx: &mut C) {
        self.entered_at = Some(Utc::now());
        self.behavior.on_enter(previous, ctx);
    }

    pub(crate) fn run_update(&mut self, dt: Duration, ctx: &mut C) {
        self.behavior.on_update(dt, ctx);
    }

    pub(crate) fn exit(&mut self, next: &str, ctx: &mut C) {
        self.behavior.on_exit(next, ctx);
    }

    /// First transition that fires, in insertion order.
    pub(crate) fn evaluate(&self, ctx: &C) -> Option<StateId> {
        self.transitions
            .iter()
            .find(|t| t.fires(ctx))
            .map(|t| t.to)
    }

    pub(crate) fn has_transition_to(&self, to: StateId) -> bool {
        self.transitions.iter().any(|t| t.to == to)
    }

    pub(crate) fn remove_transition_to(&mut self, to: StateId) -> bool {
        match self.transitions.iter().position(|t| t.to == to) {
            Some(index) => {
                self.transitions.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn purge_transitions_to(&mut self, to: StateId) {
        self.transitions.retain(|t| t.to != to);
    }

    /// Forget the owning machine and every edge into its table.
    pub(crate) fn release(&mut self) {
        self.owner = None;
        self.transitions.clear();
    }
}

impl<C> fmt::Debug for State<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("transitions", &self.transitions.len())
            .field("entered_at", &self.entered_at)
            .finish()
    }
}
