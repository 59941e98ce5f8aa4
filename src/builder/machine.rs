//! Builder for constructing machines.

use crate::builder::error::BuildError;
use crate::builder::transition::{TransitionBuilder, TransitionSpec};
use crate::config::MachineConfig;
use crate::core::{Behavior, Callbacks, State};
use crate::diagnostics::DiagnosticSink;
use crate::machine::{Machine, Node};
use crate::validation::{check_table, into_result};
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// Builder for constructing machines with a fluent API.
///
/// The whole definition is validated in [`MachineBuilder::build`]: every
/// reserved or duplicate state name and every transition to an undeclared
/// state is reported together.
///
/// # Example
///
/// ```rust
/// use hfsm::{Callbacks, MachineBuilder, ENTER};
/// use std::time::Duration;
///
/// let mut machine = MachineBuilder::new("lamp")
///     .context(0u32)
///     .state("off", Callbacks::new())
///     .state("on", Callbacks::new().on_update(|_, ticks: &mut u32| *ticks += 1))
///     .transition(ENTER, "off")
///     .guarded("off", "on", |ticks: &u32| *ticks == 0)
///     .build()
///     .unwrap();
///
/// machine.update(Duration::from_millis(10)).unwrap();
/// assert_eq!(machine.current_name(), "on");
/// ```
pub struct MachineBuilder<C: 'static> {
    name: String,
    context: Option<C>,
    states: Vec<Node<C>>,
    transitions: Vec<TransitionSpec<C>>,
    hooks: Callbacks<C>,
    behavior: Option<Box<dyn Behavior<C>>>,
    config: MachineConfig,
    sink: Option<Rc<dyn DiagnosticSink>>,
}

impl<C: 'static> MachineBuilder<C> {
    /// Create a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: None,
            states: Vec::new(),
            transitions: Vec::new(),
            hooks: Callbacks::new(),
            behavior: None,
            config: MachineConfig::default(),
            sink: None,
        }
    }

    /// Set the shared context. Without one the built machine is meant to be
    /// nested into another machine.
    pub fn context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    /// Add a leaf state with the given hooks.
    pub fn state(mut self, name: impl Into<String>, hooks: Callbacks<C>) -> Self {
        self.states.push(State::with_behavior(name, hooks).into());
        self
    }

    /// Add several leaf states at once.
    pub fn states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = (S, Callbacks<C>)>,
        S: Into<String>,
    {
        for (name, hooks) in states {
            self.states.push(State::with_behavior(name, hooks).into());
        }
        self
    }

    /// Add a prebuilt state or nested machine.
    pub fn node(mut self, node: impl Into<Node<C>>) -> Self {
        self.states.push(node.into());
        self
    }

    /// Add a nested machine.
    pub fn machine(self, machine: Machine<C>) -> Self {
        self.node(machine)
    }

    /// Add an unconditional transition.
    pub fn transition(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.transitions.push(TransitionSpec::new(from, to));
        self
    }

    /// Add a guarded transition.
    pub fn guarded<F>(mut self, from: impl Into<String>, to: impl Into<String>, guard: F) -> Self
    where
        F: Fn(&C) -> bool + 'static,
    {
        self.transitions
            .push(TransitionSpec::guarded(from, to, guard));
        self
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition_with(mut self, builder: TransitionBuilder<C>) -> Result<Self, BuildError> {
        self.transitions.push(builder.build()?);
        Ok(self)
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, transitions: impl IntoIterator<Item = TransitionSpec<C>>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Machine-level enter hook, run when the machine is entered as a child.
    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&str, &mut C) + 'static,
    {
        self.hooks = self.hooks.on_enter(hook);
        self
    }

    /// Machine-level update hook, run before the active child is ticked.
    pub fn on_update<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Duration, &mut C) + 'static,
    {
        self.hooks = self.hooks.on_update(hook);
        self
    }

    /// Machine-level exit hook, run after the active child was exited.
    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&str, &mut C) + 'static,
    {
        self.hooks = self.hooks.on_exit(hook);
        self
    }

    /// Replace the machine-level hooks with a custom behavior. Hooks set
    /// through `on_enter`, `on_update` and `on_exit` are discarded.
    pub fn behavior(mut self, behavior: impl Behavior<C> + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Route diagnostics to `sink` instead of the tracing default.
    pub fn sink(mut self, sink: Rc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the machine.
    /// Returns every definition problem at once if validation fails.
    pub fn build(self) -> Result<Machine<C>, BuildError> {
        let names: Vec<&str> = self.states.iter().map(Node::name).collect();
        let edges: Vec<(&str, &str)> = self
            .transitions
            .iter()
            .map(|t| (t.from.as_str(), t.to.as_str()))
            .collect();
        into_result(check_table(&names, &edges)).map_err(BuildError::Invalid)?;

        let machine = match self.context {
            Some(context) => Machine::new(self.name, context),
            None => Machine::nested(self.name),
        };
        let mut machine = match self.behavior {
            Some(behavior) => machine.with_behavior(behavior),
            None => machine.with_behavior(self.hooks),
        }
        .with_config(self.config);
        if let Some(sink) = self.sink {
            machine.set_sink(sink);
        }

        for state in self.states {
            machine.add_state(state)?;
        }
        for spec in self.transitions {
            machine.add_transition(&spec.from, &spec.to, spec.guard)?;
        }

        debug!(
            machine = machine.name(),
            states = machine.state_count(),
            "machine built"
        );
        Ok(machine)
    }
}
