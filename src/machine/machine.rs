//! Machines: composite states that own a table of children.

use super::node::Node;
use crate::config::MachineConfig;
use crate::core::{Behavior, Guard, MachineId, State, StateId, Transition, TransitionLog};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::HfsmError;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// Name of the reserved entry state every machine starts in.
pub const ENTER: &str = "HFSM_ENTER";

/// Name of the reserved state whose transitions are evaluated on every tick,
/// whatever the current state is.
pub const ANY: &str = "HFSM_ANY";

/// Check whether a name collides with one of the reserved pseudo-states.
pub fn is_reserved(name: &str) -> bool {
    name == ENTER || name == ANY
}

pub(crate) type SharedContext<C> = Rc<RefCell<C>>;

/// One entry of the table. The generation is bumped when the entry is
/// removed, which invalidates every handle minted for it.
pub(super) struct Slot<C: 'static> {
    pub(super) generation: u32,
    pub(super) node: Option<Node<C>>,
}

/// A composite state owning a table of child states.
///
/// Every machine is created with two reserved children, [`ENTER`] (the
/// initial state) and [`ANY`] (evaluated every tick). A machine is itself a
/// state: adding it to another machine nests it, and it then only ticks its
/// children while its parent has it selected as current.
///
/// The shared context lives in the root machine. Nested machines read the
/// root's context; guards see it as `&C`, hooks as `&mut C`.
///
/// A machine tree is single-threaded: it is neither `Send` nor `Sync`, and
/// one driver calls [`Machine::update`] on the root.
///
/// # Example
///
/// ```rust
/// use hfsm::{Machine, State, ENTER};
/// use std::time::Duration;
///
/// struct Door {
///     pushed: bool,
/// }
///
/// let mut machine = Machine::new("door", Door { pushed: false });
/// machine.add_state(State::new("closed")).unwrap();
/// machine.add_state(State::new("open")).unwrap();
/// machine.add_transition(ENTER, "closed", None).unwrap();
/// machine
///     .add_guarded_transition("closed", "open", |d: &Door| d.pushed)
///     .unwrap();
///
/// machine.update(Duration::from_millis(16)).unwrap();
/// assert_eq!(machine.current_name(), "closed");
///
/// machine.context_mut().unwrap().pushed = true;
/// machine.update(Duration::from_millis(16)).unwrap();
/// assert_eq!(machine.current_name(), "open");
/// ```
pub struct Machine<C: 'static> {
    pub(super) id: MachineId,
    pub(super) base: State<C>,
    pub(super) slots: Vec<Slot<C>>,
    pub(super) free: Vec<usize>,
    pub(super) names: HashMap<String, StateId>,
    pub(super) enter: StateId,
    pub(super) any: StateId,
    pub(super) current: StateId,
    pub(super) parent: Option<MachineId>,
    /// Set while the parent has this machine as its current state.
    pub(super) selected: bool,
    pub(super) context: Option<SharedContext<C>>,
    pub(super) sink: Rc<dyn DiagnosticSink>,
    pub(super) config: MachineConfig,
    pub(super) history: TransitionLog,
}

impl<C: 'static> Machine<C> {
    /// Create a root machine that owns `context`.
    pub fn new(name: impl Into<String>, context: C) -> Self {
        Self::with_shared_context(name.into(), Some(Rc::new(RefCell::new(context))))
    }

    /// Create a machine without a context, meant to be added to another
    /// machine. It reads its parent's context once attached.
    pub fn nested(name: impl Into<String>) -> Self {
        Self::with_shared_context(name.into(), None)
    }

    fn with_shared_context(name: String, context: Option<SharedContext<C>>) -> Self {
        let id = MachineId::new();
        let config = MachineConfig::default();
        let enter = StateId::new(id, 0);
        let any = StateId::new(id, 1);

        let mut slots = Vec::with_capacity(4);
        let mut names = HashMap::new();
        for (handle, reserved) in [(enter, ENTER), (any, ANY)] {
            let mut state = State::new(reserved);
            state.owner = Some(id);
            slots.push(Slot {
                generation: 0,
                node: Some(Node::State(state)),
            });
            names.insert(reserved.to_string(), handle);
        }

        Self {
            id,
            base: State::new(name),
            slots,
            free: Vec::new(),
            names,
            enter,
            any,
            current: enter,
            parent: None,
            selected: false,
            context,
            sink: Rc::new(TracingSink),
            history: TransitionLog::new(config.history_capacity),
            config,
        }
    }

    /// Replace the runtime configuration. Clears the history.
    pub fn with_config(mut self, config: MachineConfig) -> Self {
        self.history = TransitionLog::new(config.history_capacity);
        self.config = config;
        self
    }

    /// Set the machine-level hooks, run when this machine is entered, ticked
    /// or exited as a state of its parent. A root machine only runs
    /// `on_update`.
    pub fn with_behavior(mut self, behavior: impl Behavior<C> + 'static) -> Self {
        self.base.set_behavior(Box::new(behavior));
        self
    }

    /// Route diagnostics to `sink`. Nested machines share it.
    pub fn with_sink(mut self, sink: Rc<dyn DiagnosticSink>) -> Self {
        self.set_sink(sink);
        self
    }

    pub fn set_sink(&mut self, sink: Rc<dyn DiagnosticSink>) {
        self.sink = sink;
        self.share_down();
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    /// This machine's own state record, as seen by its parent.
    pub fn as_state(&self) -> &State<C> {
        &self.base
    }

    /// The machine this one was added to, if any.
    pub fn parent(&self) -> Option<MachineId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// True while this machine is nested and its parent has it as current.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Recent state changes of this machine (not of its children).
    pub fn history(&self) -> &TransitionLog {
        &self.history
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Borrow the shared context.
    pub fn context(&self) -> Option<Ref<'_, C>> {
        self.context.as_ref().map(|c| c.borrow())
    }

    /// Mutably borrow the shared context.
    pub fn context_mut(&mut self) -> Option<RefMut<'_, C>> {
        self.context.as_ref().map(|c| c.borrow_mut())
    }

    pub fn enter_id(&self) -> StateId {
        self.enter
    }

    pub fn any_id(&self) -> StateId {
        self.any
    }

    pub fn current_id(&self) -> StateId {
        self.current
    }

    /// The active child.
    pub fn current(&self) -> &Node<C> {
        self.node(self.current)
            .expect("current state is always registered")
    }

    pub fn current_name(&self) -> &str {
        self.current().name()
    }

    /// Look up an entry by handle. Handles minted by other machines never
    /// resolve.
    pub fn node(&self, id: StateId) -> Option<&Node<C>> {
        if id.machine() != self.id {
            return None;
        }
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    pub(super) fn node_mut(&mut self, id: StateId) -> Option<&mut Node<C>> {
        if id.machine() != self.id {
            return None;
        }
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    pub(super) fn nodes(&self) -> impl Iterator<Item = &Node<C>> {
        self.slots.iter().filter_map(|slot| slot.node.as_ref())
    }

    fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node<C>> {
        self.slots.iter_mut().filter_map(|slot| slot.node.as_mut())
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&Node<C>> {
        self.node(self.id_of(name)?)
    }

    pub fn id_of(&self, name: &str) -> Option<StateId> {
        self.names.get(name).copied()
    }

    pub fn state(&self, id: StateId) -> Option<&State<C>> {
        self.node(id).map(Node::as_state)
    }

    pub fn machine(&self, id: StateId) -> Option<&Machine<C>> {
        self.node(id)?.as_machine()
    }

    /// Mutable access to a nested machine, e.g. to wire its children after
    /// it was attached.
    pub fn machine_mut(&mut self, id: StateId) -> Option<&mut Machine<C>> {
        self.node_mut(id)?.as_machine_mut()
    }

    pub fn machine_named_mut(&mut self, name: &str) -> Option<&mut Machine<C>> {
        let id = self.id_of(name)?;
        self.machine_mut(id)
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Identity check: true only if `id` was minted by this machine and is
    /// still registered. Equal names in other machines do not count.
    pub fn contains(&self, id: StateId) -> bool {
        self.node(id).is_some()
    }

    /// Names of all registered entries, reserved ones included, in table
    /// order. A new entry takes the place of the most recently removed one.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.nodes().map(Node::name)
    }

    /// Number of registered entries, reserved ones included.
    pub fn state_count(&self) -> usize {
        self.names.len()
    }

    pub(super) fn name_of(&self, id: StateId) -> &str {
        self.node(id).map_or("", Node::name)
    }

    pub(super) fn report(&self, error: HfsmError) -> HfsmError {
        self.sink.report(&Diagnostic {
            machine: self.name(),
            error: &error,
        });
        error
    }

    fn resolve(&self, name: &str) -> Result<StateId, HfsmError> {
        self.id_of(name).ok_or_else(|| {
            self.report(HfsmError::UnknownState {
                name: name.to_string(),
            })
        })
    }

    fn check_handle(&self, id: StateId) -> Result<(), HfsmError> {
        if id.machine() != self.id {
            return Err(self.report(HfsmError::UnownedState {
                machine: self.name().to_string(),
            }));
        }
        if self.node(id).is_none() {
            return Err(self.report(HfsmError::UnknownState {
                name: id.to_string(),
            }));
        }
        Ok(())
    }

    /// Register a state or a nested machine under its name.
    ///
    /// An existing entry with the same name is replaced: it is removed as by
    /// [`Machine::remove_state`] first. Reserved names are rejected.
    ///
    /// A nested machine always runs on this machine's context and sink. A
    /// machine created with [`Machine::new`] loses its own context when it
    /// is added.
    pub fn add_state(&mut self, node: impl Into<Node<C>>) -> Result<StateId, HfsmError> {
        let mut node = node.into();
        let name = node.name().to_string();
        if is_reserved(&name) {
            return Err(self.report(HfsmError::ReservedName { name }));
        }
        if let Some(existing) = self.id_of(&name) {
            debug!(machine = self.name(), state = %name, "replacing state with the same name");
            self.detach(existing);
        }

        node.as_state_mut().owner = Some(self.id);
        if let Node::Machine(child) = &mut node {
            if child.context.is_some() {
                debug!(
                    machine = self.name(),
                    child = child.name(),
                    "nested machine's own context is replaced by its parent's"
                );
            }
            child.parent = Some(self.id);
            child.selected = false;
            child.context = self.context.clone();
            child.sink = Rc::clone(&self.sink);
            child.share_down();
        }
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: None,
                });
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        let id = StateId::versioned(self.id, index, slot.generation);
        slot.node = Some(node);
        self.names.insert(name, id);
        Ok(id)
    }

    /// Register several entries. Every entry is attempted; the first error,
    /// if any, is returned.
    pub fn add_states<I, N>(&mut self, states: I) -> Result<Vec<StateId>, HfsmError>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node<C>>,
    {
        let mut ids = Vec::new();
        let mut first_error = None;
        for state in states {
            match self.add_state(state) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(ids),
        }
    }

    /// Detach an entry and hand it back.
    ///
    /// If the entry is current, the machine first changes to [`ENTER`].
    /// Transitions pointing at the entry are removed, as are the entry's own
    /// outgoing transitions.
    pub fn remove_state(&mut self, name: &str) -> Result<Node<C>, HfsmError> {
        if is_reserved(name) {
            return Err(self.report(HfsmError::ReservedName {
                name: name.to_string(),
            }));
        }
        let id = self.resolve(name)?;
        self.detach(id).ok_or_else(|| {
            self.report(HfsmError::UnknownState {
                name: name.to_string(),
            })
        })
    }

    fn detach(&mut self, id: StateId) -> Option<Node<C>> {
        if self.current == id {
            self.fall_back_to_enter();
        }
        for node in self.nodes_mut() {
            node.as_state_mut().purge_transitions_to(id);
        }

        let slot = self
            .slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())?;
        let mut node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());

        self.names.remove(node.name());
        node.as_state_mut().release();
        if let Node::Machine(child) = &mut node {
            child.parent = None;
            child.selected = false;
            child.context = None;
            child.share_down();
        }
        Some(node)
    }

    /// Add a transition between two registered states.
    ///
    /// Fails without effect if either name is unknown or the edge already
    /// exists. Transitions are evaluated in the order they were added.
    pub fn add_transition(
        &mut self,
        from: &str,
        to: &str,
        guard: Option<Guard<C>>,
    ) -> Result<(), HfsmError> {
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        self.add_transition_between(from, to, guard)
    }

    /// Shorthand for [`Machine::add_transition`] with a guard closure.
    pub fn add_guarded_transition<F>(&mut self, from: &str, to: &str, guard: F) -> Result<(), HfsmError>
    where
        F: Fn(&C) -> bool + 'static,
    {
        self.add_transition(from, to, Some(Guard::new(guard)))
    }

    /// Handle-based variant of [`Machine::add_transition`]. Handles minted by
    /// another machine are rejected.
    pub fn add_transition_between(
        &mut self,
        from: StateId,
        to: StateId,
        guard: Option<Guard<C>>,
    ) -> Result<(), HfsmError> {
        self.check_handle(from)?;
        self.check_handle(to)?;
        if self.has_transition_between(from, to) {
            return Err(self.report(HfsmError::DuplicateTransition {
                from: self.name_of(from).to_string(),
                to: self.name_of(to).to_string(),
            }));
        }

        trace!(
            machine = self.name(),
            from = self.name_of(from),
            to = self.name_of(to),
            guarded = guard.is_some(),
            "transition added"
        );
        if let Some(node) = self.node_mut(from) {
            node.as_state_mut()
                .transitions
                .push(Transition::new(from, to, guard));
        }
        Ok(())
    }

    /// Remove the transition `from -> to`.
    pub fn remove_transition(&mut self, from: &str, to: &str) -> Result<(), HfsmError> {
        let from_id = self.resolve(from)?;
        let to_id = self.resolve(to)?;
        let removed = self
            .node_mut(from_id)
            .is_some_and(|node| node.as_state_mut().remove_transition_to(to_id));
        if removed {
            Ok(())
        } else {
            Err(self.report(HfsmError::MissingTransition {
                from: from.to_string(),
                to: to.to_string(),
            }))
        }
    }

    /// Check for a transition `from -> to`. Unknown names yield `false`.
    pub fn has_transition(&self, from: &str, to: &str) -> bool {
        match (self.id_of(from), self.id_of(to)) {
            (Some(from), Some(to)) => self.has_transition_between(from, to),
            _ => false,
        }
    }

    pub fn has_transition_between(&self, from: StateId, to: StateId) -> bool {
        self.state(from)
            .is_some_and(|state| state.has_transition_to(to))
    }

    /// Point every nested machine at this machine's context and sink.
    fn share_down(&mut self) {
        let context = self.context.clone();
        let sink = Rc::clone(&self.sink);
        for node in self.nodes_mut() {
            if let Node::Machine(child) = node {
                child.context = context.clone();
                child.sink = Rc::clone(&sink);
                child.share_down();
            }
        }
    }
}

impl<C: 'static> fmt::Debug for Machine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name())
            .field("id", &self.id)
            .field("current", &self.name_of(self.current))
            .field("states", &self.state_names().collect::<Vec<_>>())
            .field("parent", &self.parent)
            .field("selected", &self.selected)
            .field("has_context", &self.context.is_some())
            .finish()
    }
}
