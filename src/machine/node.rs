//! Entries of a machine's state table.

use super::Machine;
use crate::core::State;
use std::fmt;

/// An entry in a machine's table: a leaf state or a nested machine.
///
/// Both [`State`] and [`Machine`] convert into a `Node`, so either can be
/// passed to [`Machine::add_state`].
pub enum Node<C: 'static> {
    State(State<C>),
    Machine(Box<Machine<C>>),
}

impl<C: 'static> Node<C> {
    pub fn name(&self) -> &str {
        self.as_state().name()
    }

    /// The state record of this entry. For a nested machine this is the
    /// machine's own record: its name, its hooks, and its transitions to
    /// siblings.
    pub fn as_state(&self) -> &State<C> {
        match self {
            Node::State(state) => state,
            Node::Machine(machine) => machine.as_state(),
        }
    }

    pub(crate) fn as_state_mut(&mut self) -> &mut State<C> {
        match self {
            Node::State(state) => state,
            Node::Machine(machine) => &mut machine.base,
        }
    }

    pub fn is_machine(&self) -> bool {
        matches!(self, Node::Machine(_))
    }

    pub fn as_machine(&self) -> Option<&Machine<C>> {
        match self {
            Node::Machine(machine) => Some(machine),
            Node::State(_) => None,
        }
    }

    pub fn as_machine_mut(&mut self) -> Option<&mut Machine<C>> {
        match self {
            Node::Machine(machine) => Some(machine),
            Node::State(_) => None,
        }
    }

    /// Unwrap a nested machine.
    pub fn into_machine(self) -> Option<Machine<C>> {
        match self {
            Node::Machine(machine) => Some(*machine),
            Node::State(_) => None,
        }
    }

    pub(crate) fn enter(&mut self, previous: &str, ctx: &mut C) {
        match self {
            Node::State(state) => state.enter(previous, ctx),
            Node::Machine(machine) => machine.enter_as_child(previous, ctx),
        }
    }

    pub(crate) fn exit(&mut self, next: &str, ctx: &mut C) {
        match self {
            Node::State(state) => state.exit(next, ctx),
            Node::Machine(machine) => machine.exit_as_child(next, ctx),
        }
    }
}

impl<C: 'static> fmt::Debug for Node<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::State(state) => f.debug_tuple("State").field(state).finish(),
            Node::Machine(machine) => f.debug_tuple("Machine").field(machine).finish(),
        }
    }
}

impl<C: 'static> From<State<C>> for Node<C> {
    fn from(state: State<C>) -> Self {
        Node::State(state)
    }
}

impl<C: 'static> From<Machine<C>> for Node<C> {
    fn from(machine: Machine<C>) -> Self {
        Node::Machine(Box::new(machine))
    }
}
