//! State changes and the hierarchical tick.

use super::machine::{Machine, SharedContext, ENTER};
use super::node::Node;
use crate::core::StateId;
use crate::error::HfsmError;
use std::time::Duration;
use tracing::{debug, trace};

impl<C: 'static> Machine<C> {
    /// Make `name` the current state.
    ///
    /// Changing to the current state is a no-op and runs no hooks. Otherwise
    /// the current state is exited before the new one is entered. Unknown
    /// names leave the machine untouched.
    pub fn change_to_state(&mut self, name: &str) -> Result<(), HfsmError> {
        if self.current_name() == name {
            return Ok(());
        }
        let Some(next) = self.id_of(name) else {
            return Err(self.report(HfsmError::UnknownState {
                name: name.to_string(),
            }));
        };
        let context = self.require_context()?;
        let mut ctx = context.borrow_mut();
        self.switch_to(next, &mut ctx);
        Ok(())
    }

    /// Advance the tree by one tick.
    ///
    /// Runs this machine's own update hook, then ANY, then the current
    /// child. A transition that fires pre-empts the update hook of the state
    /// it leaves. An edge whose target is already current does not count as
    /// firing, so the update hooks still run. A state entered during the
    /// tick does not get its update hook until the next tick, but its
    /// transitions are evaluated right away so a chain of open guards
    /// settles within one call. A nested machine entered this way settles
    /// its own subtree in the same call. More than `settle_limit` changes at
    /// one level abort the update with [`HfsmError::SettleLimitExceeded`].
    ///
    /// A nested machine can be updated directly only while its parent has
    /// it selected; that ticks its subtree as the parent would. Otherwise
    /// the call fails with [`HfsmError::InactiveMachine`].
    pub fn update(&mut self, dt: Duration) -> Result<(), HfsmError> {
        if self.parent.is_some() && !self.selected {
            return Err(self.report(HfsmError::InactiveMachine {
                machine: self.name().to_string(),
            }));
        }
        let context = self.require_context()?;
        let mut ctx = context.borrow_mut();
        self.base.run_update(dt, &mut ctx);
        self.tick(dt, &mut ctx)
    }

    fn require_context(&self) -> Result<SharedContext<C>, HfsmError> {
        self.context.clone().ok_or_else(|| {
            self.report(HfsmError::MissingContext {
                machine: self.name().to_string(),
            })
        })
    }

    /// Tick ANY and the current child, then let chained transitions settle.
    fn tick(&mut self, dt: Duration, ctx: &mut C) -> Result<(), HfsmError> {
        let entry = self.current;
        self.step(self.any, dt, ctx)?;
        if self.current == entry {
            self.step(self.current, dt, ctx)?;
        }
        self.settle(entry, ctx)
    }

    fn step(&mut self, id: StateId, dt: Duration, ctx: &mut C) -> Result<(), HfsmError> {
        let current = self.current;
        if let Some(target) = self.fire(id, ctx).filter(|t| *t != current) {
            self.switch_to(target, ctx);
            return Ok(());
        }

        // A nested machine only ticks its children while it is our current.
        let selected = id == self.current;
        match self.node_mut(id) {
            Some(Node::State(state)) => {
                state.run_update(dt, ctx);
                Ok(())
            }
            Some(Node::Machine(child)) => {
                child.base.run_update(dt, ctx);
                if selected {
                    child.tick(dt, ctx)
                } else {
                    Ok(())
                }
            }
            None => Ok(()),
        }
    }

    fn settle(&mut self, entry: StateId, ctx: &mut C) -> Result<(), HfsmError> {
        if self.current == entry {
            return Ok(());
        }
        let limit = self.config.settle_limit;
        let mut changes = 1;
        loop {
            let current = self.current;
            let Some(target) = self.fire(current, ctx).filter(|t| *t != current) else {
                return self.settle_selected(ctx);
            };
            if changes >= limit {
                return Err(self.report(HfsmError::SettleLimitExceeded {
                    machine: self.name().to_string(),
                    limit,
                }));
            }
            self.switch_to(target, ctx);
            changes += 1;
        }
    }

    /// Let a nested machine that was entered during this tick settle too.
    fn settle_selected(&mut self, ctx: &mut C) -> Result<(), HfsmError> {
        match self.node_mut(self.current) {
            Some(Node::Machine(child)) => child.settle_entered(ctx),
            _ => Ok(()),
        }
    }

    /// Evaluate ANY and ENTER of a freshly entered machine without running
    /// update hooks, then settle from wherever that lands.
    fn settle_entered(&mut self, ctx: &mut C) -> Result<(), HfsmError> {
        let entry = self.current;
        let target = self
            .fire(self.any, ctx)
            .filter(|t| *t != entry)
            .or_else(|| self.fire(entry, ctx).filter(|t| *t != entry));
        match target {
            Some(target) => {
                self.switch_to(target, ctx);
                self.settle(entry, ctx)
            }
            None => Ok(()),
        }
    }

    fn fire(&self, id: StateId, ctx: &C) -> Option<StateId> {
        self.node(id)?.as_state().evaluate(ctx)
    }

    fn switch_to(&mut self, next: StateId, ctx: &mut C) {
        let previous = self.current;
        let previous_name = self.name_of(previous).to_string();
        let next_name = self.name_of(next).to_string();

        if let Some(node) = self.node_mut(previous) {
            node.exit(&next_name, ctx);
        }
        if let Some(node) = self.node_mut(next) {
            node.enter(&previous_name, ctx);
        }
        self.current = next;

        trace!(machine = self.name(), from = %previous_name, to = %next_name, "state changed");
        self.history.record(previous_name, next_name);
    }

    /// Leave the current state for ENTER, running hooks when a context is
    /// available.
    pub(super) fn fall_back_to_enter(&mut self) {
        if self.current == self.enter {
            return;
        }
        match self.context.clone() {
            Some(context) => {
                let mut ctx = context.borrow_mut();
                self.switch_to(self.enter, &mut ctx);
            }
            None => {
                debug!(
                    machine = self.name(),
                    state = self.name_of(self.current),
                    "no context, leaving state without hooks"
                );
                let previous = self.name_of(self.current).to_string();
                if let Some(Node::Machine(child)) = self.node_mut(self.current) {
                    child.selected = false;
                }
                self.current = self.enter;
                self.history.record(previous, ENTER);
            }
        }
    }

    /// Entered as a child of the parent machine: run our own enter hook,
    /// then land on ENTER.
    pub(super) fn enter_as_child(&mut self, previous: &str, ctx: &mut C) {
        self.base.enter(previous, ctx);
        self.selected = true;
        self.current = self.enter;
        if let Some(node) = self.node_mut(self.enter) {
            node.enter(previous, ctx);
        }
    }

    /// Exited by the parent machine: leave the active child first, then run
    /// our own exit hook.
    pub(super) fn exit_as_child(&mut self, next: &str, ctx: &mut C) {
        if self.current != self.enter {
            let leaving = self.current;
            let leaving_name = self.name_of(leaving).to_string();
            if let Some(node) = self.node_mut(leaving) {
                node.exit(ENTER, ctx);
            }
            self.current = self.enter;
            self.history.record(leaving_name, ENTER);
        }
        self.selected = false;
        self.base.exit(next, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Callbacks, Guard, State};
    use crate::diagnostics::CollectingSink;
    use crate::machine::ANY;
    use crate::MachineConfig;
    use std::rc::Rc;

    const TICK: Duration = Duration::from_millis(16);

    /// Context that records every hook call as "<hook>:<state>".
    #[derive(Default)]
    struct Trace {
        events: Vec<String>,
        open: bool,
    }

    impl Trace {
        fn count(&self, event: &str) -> usize {
            self.events.iter().filter(|e| *e == event).count()
        }
    }

    fn traced(name: &'static str) -> State<Trace> {
        State::with_behavior(
            name,
            Callbacks::new()
                .on_enter(move |_, t: &mut Trace| t.events.push(format!("enter:{name}")))
                .on_update(move |_, t: &mut Trace| t.events.push(format!("update:{name}")))
                .on_exit(move |_, t: &mut Trace| t.events.push(format!("exit:{name}"))),
        )
    }

    fn traced_machine(name: &'static str) -> Machine<Trace> {
        Machine::nested(name).with_behavior(
            Callbacks::new()
                .on_enter(move |_, t: &mut Trace| t.events.push(format!("enter:{name}")))
                .on_update(move |_, t: &mut Trace| t.events.push(format!("update:{name}")))
                .on_exit(move |_, t: &mut Trace| t.events.push(format!("exit:{name}"))),
        )
    }

    fn events(machine: &Machine<Trace>) -> Vec<String> {
        machine.context().unwrap().events.clone()
    }

    #[test]
    fn change_to_state_runs_exit_then_enter() {
        let mut machine = Machine::new("m", Trace::default());
        machine.add_states([traced("a"), traced("b")]).unwrap();

        machine.change_to_state("a").unwrap();
        machine.change_to_state("b").unwrap();

        assert_eq!(machine.current_name(), "b");
        assert_eq!(events(&machine), vec!["enter:a", "exit:a", "enter:b"]);
    }

    #[test]
    fn enter_receives_previous_and_exit_receives_next() {
        let mut machine = Machine::new("m", Vec::<String>::new());
        machine
            .add_state(State::with_behavior(
                "a",
                Callbacks::new()
                    .on_enter(|prev, log: &mut Vec<String>| log.push(format!("a<{prev}")))
                    .on_exit(|next, log: &mut Vec<String>| log.push(format!("a>{next}"))),
            ))
            .unwrap();
        machine.add_state(State::new("b")).unwrap();

        machine.change_to_state("a").unwrap();
        machine.change_to_state("b").unwrap();

        let log = machine.context().unwrap().clone();
        assert_eq!(log, vec![format!("a<{ENTER}"), "a>b".to_string()]);
    }

    #[test]
    fn change_to_current_state_is_noop() {
        let mut machine = Machine::new("m", Trace::default());
        machine.add_state(traced("a")).unwrap();
        machine.change_to_state("a").unwrap();

        machine.change_to_state("a").unwrap();

        assert_eq!(events(&machine), vec!["enter:a"]);
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn change_to_unknown_state_reports_once() {
        let sink = Rc::new(CollectingSink::new());
        let mut machine = Machine::new("m", Trace::default()).with_sink(sink.clone());

        let result = machine.change_to_state("ghost");

        assert!(matches!(result, Err(HfsmError::UnknownState { .. })));
        assert_eq!(machine.current_name(), ENTER);
        assert_eq!(sink.len(), 1);
        assert!(events(&machine).is_empty());
    }

    #[test]
    fn update_follows_open_transition_in_one_tick() {
        let mut machine = Machine::new("m", Trace::default());
        machine.add_state(traced("a")).unwrap();
        machine.add_transition(ENTER, "a", None).unwrap();

        machine.update(TICK).unwrap();

        assert_eq!(machine.current_name(), "a");
        assert_eq!(events(&machine), vec!["enter:a"]);

        machine.update(TICK).unwrap();
        assert_eq!(events(&machine), vec!["enter:a", "update:a"]);
    }

    #[test]
    fn closed_guard_lets_update_run() {
        let mut machine = Machine::new("m", Trace::default());
        machine.add_states([traced("a"), traced("b")]).unwrap();
        machine.change_to_state("a").unwrap();
        machine
            .add_guarded_transition("a", "b", |t: &Trace| t.open)
            .unwrap();

        machine.update(TICK).unwrap();
        assert_eq!(machine.current_name(), "a");

        machine.context_mut().unwrap().open = true;
        machine.update(TICK).unwrap();

        assert_eq!(machine.current_name(), "b");
        assert_eq!(
            events(&machine),
            vec!["enter:a", "update:a", "exit:a", "enter:b"]
        );
    }

    #[test]
    fn first_matching_transition_wins() {
        let mut machine = Machine::new("m", Trace::default());
        machine.add_states([traced("a"), traced("b")]).unwrap();
        machine
            .add_transition(ENTER, "b", Some(Guard::new(|_: &Trace| true)))
            .unwrap();
        machine.add_transition(ENTER, "a", None).unwrap();

        machine.update(TICK).unwrap();

        assert_eq!(machine.current_name(), "b");
    }

    #[test]
    fn chain_of_open_transitions_settles_in_one_tick() {
        let mut machine = Machine::new("m", Trace::default());
        machine
            .add_states([traced("a"), traced("b"), traced("c")])
            .unwrap();
        machine.add_transition(ENTER, "a", None).unwrap();
        machine.add_transition("a", "b", None).unwrap();
        machine.add_transition("b", "c", None).unwrap();

        machine.update(TICK).unwrap();

        assert_eq!(machine.current_name(), "c");
        assert_eq!(
            events(&machine),
            vec!["enter:a", "exit:a", "enter:b", "exit:b", "enter:c"]
        );
        assert_eq!(machine.history().path(), vec![ENTER, "a", "b", "c"]);
    }

    #[test]
    fn transition_cycle_hits_settle_limit() {
        let sink = Rc::new(CollectingSink::new());
        let mut machine = Machine::new("m", Trace::default())
            .with_config(MachineConfig::default().with_settle_limit(8))
            .with_sink(sink.clone());
        machine.add_states([traced("a"), traced("b")]).unwrap();
        machine.add_transition(ENTER, "a", None).unwrap();
        machine.add_transition("a", "b", None).unwrap();
        machine.add_transition("b", "a", None).unwrap();

        let result = machine.update(TICK);

        assert_eq!(
            result,
            Err(HfsmError::SettleLimitExceeded {
                machine: "m".to_string(),
                limit: 8
            })
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(machine.history().len(), 8);
    }

    #[test]
    fn any_state_redirects_from_anywhere() {
        let mut machine = Machine::new("m", Trace::default());
        machine
            .add_states([traced("idle"), traced("alarm")])
            .unwrap();
        machine.change_to_state("idle").unwrap();
        machine
            .add_guarded_transition(ANY, "alarm", |t: &Trace| t.open)
            .unwrap();

        machine.update(TICK).unwrap();
        assert_eq!(machine.current_name(), "idle");

        machine.context_mut().unwrap().open = true;
        machine.update(TICK).unwrap();

        assert_eq!(machine.current_name(), "alarm");
        assert_eq!(
            events(&machine),
            vec!["enter:idle", "update:idle", "exit:idle", "enter:alarm"]
        );

        // ANY pointing at the current state does not pre-empt its update.
        machine.update(TICK).unwrap();
        machine.update(TICK).unwrap();
        assert_eq!(machine.context().unwrap().count("update:alarm"), 2);
    }

    #[test]
    fn root_update_hook_runs_every_tick() {
        let mut machine = Machine::new("m", 0u32)
            .with_behavior(Callbacks::new().on_update(|_, n: &mut u32| *n += 1));

        machine.update(TICK).unwrap();
        machine.update(TICK).unwrap();

        assert_eq!(*machine.context().unwrap(), 2);
    }

    #[test]
    fn nested_machine_propagates_enter_and_exit() {
        let mut root = Machine::new("root", Trace::default());
        let sub_id = root.add_state(traced_machine("sub")).unwrap();
        root.machine_mut(sub_id)
            .unwrap()
            .add_state(traced("inner"))
            .unwrap();

        root.change_to_state("sub").unwrap();
        root.machine_mut(sub_id)
            .unwrap()
            .change_to_state("inner")
            .unwrap();
        root.change_to_state(ENTER).unwrap();

        assert_eq!(
            events(&root),
            vec!["enter:sub", "enter:inner", "exit:inner", "exit:sub"]
        );
        assert_eq!(root.machine(sub_id).unwrap().current_name(), ENTER);
    }

    #[test]
    fn nested_machine_ticks_only_while_selected() {
        let mut root = Machine::new("root", Trace::default());
        root.add_state(traced("other")).unwrap();
        let sub_id = root.add_state(traced_machine("sub")).unwrap();
        {
            let sub = root.machine_mut(sub_id).unwrap();
            sub.add_state(traced("inner")).unwrap();
            sub.add_transition(ENTER, "inner", None).unwrap();
        }

        root.update(TICK).unwrap();
        assert_eq!(root.machine(sub_id).unwrap().current_name(), ENTER);

        root.change_to_state("sub").unwrap();
        root.update(TICK).unwrap();
        root.update(TICK).unwrap();

        assert_eq!(root.machine(sub_id).unwrap().current_name(), "inner");
        assert_eq!(root.context().unwrap().count("update:inner"), 1);

        root.change_to_state("other").unwrap();
        root.update(TICK).unwrap();

        let trace = root.context().unwrap();
        assert_eq!(trace.count("update:inner"), 1);
        assert_eq!(trace.count("update:other"), 1);
    }

    #[test]
    fn nested_machine_transition_preempts_its_subtree() {
        let mut root = Machine::new("root", Trace::default());
        root.add_state(traced("other")).unwrap();
        let sub_id = root.add_state(traced_machine("sub")).unwrap();
        root.machine_mut(sub_id)
            .unwrap()
            .add_state(traced("inner"))
            .unwrap();
        root.machine_mut(sub_id)
            .unwrap()
            .add_transition(ENTER, "inner", None)
            .unwrap();
        root.change_to_state("sub").unwrap();
        root.add_guarded_transition("sub", "other", |t: &Trace| t.open)
            .unwrap();
        root.context_mut().unwrap().open = true;

        root.update(TICK).unwrap();

        assert_eq!(root.current_name(), "other");
        let trace = root.context().unwrap();
        assert_eq!(trace.count("update:sub"), 0);
        assert_eq!(trace.count("enter:inner"), 0);
    }

    #[test]
    fn direct_update_of_unselected_nested_machine_fails() {
        let sink = Rc::new(CollectingSink::new());
        let mut root = Machine::new("root", Trace::default()).with_sink(sink.clone());
        let sub_id = root.add_state(traced_machine("sub")).unwrap();

        let result = root.machine_mut(sub_id).unwrap().update(TICK);

        assert_eq!(
            result,
            Err(HfsmError::InactiveMachine {
                machine: "sub".to_string()
            })
        );
        assert_eq!(sink.len(), 1);
        assert!(events(&root).is_empty());
    }

    #[test]
    fn direct_update_of_selected_nested_machine_ticks_it() {
        let mut root = Machine::new("root", Trace::default());
        let sub_id = root.add_state(traced_machine("sub")).unwrap();
        {
            let sub = root.machine_mut(sub_id).unwrap();
            sub.add_state(traced("inner")).unwrap();
            sub.add_transition(ENTER, "inner", None).unwrap();
        }
        root.change_to_state("sub").unwrap();
        assert!(root.machine(sub_id).unwrap().is_selected());

        root.machine_mut(sub_id).unwrap().update(TICK).unwrap();

        assert_eq!(root.machine(sub_id).unwrap().current_name(), "inner");
        assert_eq!(events(&root), vec!["enter:sub", "update:sub", "enter:inner"]);

        root.change_to_state(ENTER).unwrap();
        assert!(!root.machine(sub_id).unwrap().is_selected());
    }

    #[test]
    fn entered_nested_machine_settles_in_the_same_tick() {
        let mut root = Machine::new("root", Trace::default());
        let sub_id = root.add_state(traced_machine("sub")).unwrap();
        {
            let sub = root.machine_mut(sub_id).unwrap();
            sub.add_state(traced("idle")).unwrap();
            sub.add_transition(ENTER, "idle", None).unwrap();
        }
        root.add_transition(ENTER, "sub", None).unwrap();

        root.update(TICK).unwrap();

        assert_eq!(root.current_name(), "sub");
        assert_eq!(root.machine(sub_id).unwrap().current_name(), "idle");
        assert_eq!(events(&root), vec!["enter:sub", "enter:idle"]);
    }

    #[test]
    fn nested_any_applies_when_machine_is_entered() {
        let mut root = Machine::new("root", Trace { open: true, ..Default::default() });
        let sub_id = root.add_state(traced_machine("sub")).unwrap();
        {
            let sub = root.machine_mut(sub_id).unwrap();
            sub.add_states([traced("idle"), traced("panic")]).unwrap();
            sub.add_transition(ENTER, "idle", None).unwrap();
            sub.add_guarded_transition(ANY, "panic", |t: &Trace| t.open)
                .unwrap();
        }
        root.add_transition(ENTER, "sub", None).unwrap();

        root.update(TICK).unwrap();

        assert_eq!(root.machine(sub_id).unwrap().current_name(), "panic");
        assert_eq!(root.context().unwrap().count("enter:idle"), 0);
    }

    #[test]
    fn self_edge_does_not_preempt_update() {
        let mut machine = Machine::new("m", Trace::default());
        machine.add_state(traced("a")).unwrap();
        machine.change_to_state("a").unwrap();
        machine.add_transition("a", "a", None).unwrap();

        machine.update(TICK).unwrap();
        machine.update(TICK).unwrap();

        assert_eq!(machine.context().unwrap().count("update:a"), 2);
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn detached_machine_without_context_cannot_be_driven() {
        let sink = Rc::new(CollectingSink::new());
        let mut machine: Machine<Trace> = Machine::nested("lonely").with_sink(sink.clone());
        machine.add_state(State::new("a")).unwrap();

        assert_eq!(
            machine.update(TICK),
            Err(HfsmError::MissingContext {
                machine: "lonely".to_string()
            })
        );
        assert!(matches!(
            machine.change_to_state("a"),
            Err(HfsmError::MissingContext { .. })
        ));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn removing_current_state_falls_back_to_enter() {
        let mut machine = Machine::new("m", Trace::default());
        machine.add_state(traced("a")).unwrap();
        machine.change_to_state("a").unwrap();

        machine.remove_state("a").unwrap();

        assert_eq!(machine.current_name(), ENTER);
        assert_eq!(events(&machine), vec!["enter:a", "exit:a"]);
    }

    #[test]
    fn removing_current_state_without_context_skips_hooks() {
        let mut machine: Machine<Trace> = Machine::nested("m");
        machine.add_state(State::new("a")).unwrap();
        machine.current = machine.id_of("a").unwrap();

        machine.remove_state("a").unwrap();

        assert_eq!(machine.current_name(), ENTER);
        assert_eq!(machine.history().path(), vec!["a", ENTER]);
    }

    #[test]
    fn history_records_changes() {
        let mut machine = Machine::new("m", Trace::default());
        machine.add_states([traced("a"), traced("b")]).unwrap();

        machine.change_to_state("a").unwrap();
        machine.change_to_state("b").unwrap();

        let last = machine.history().last().unwrap();
        assert_eq!((last.from.as_str(), last.to.as_str()), ("a", "b"));
        assert!(machine.current().as_state().entered_at().is_some());
    }
}
