//! Externally authored machine tables.
//!
//! A [`Blueprint`] describes a machine tree as data: state names, nested
//! machines, and transitions whose guards and hooks are referenced by name
//! through a [`Registry`]. Blueprints are loaded from JSON, validated as a
//! whole, and then instantiated into a live [`Machine`].
//!
//! ```json
//! {
//!   "version": 1,
//!   "name": "guard",
//!   "states": [
//!     { "kind": "state", "name": "patrol", "behavior": "walk" },
//!     { "kind": "machine", "name": "combat", "states": [{ "kind": "state", "name": "attack" }] }
//!   ],
//!   "transitions": [
//!     { "from": "HFSM_ENTER", "to": "patrol" },
//!     { "from": "patrol", "to": "combat", "guard": "enemy_visible" }
//!   ]
//! }
//! ```

use crate::config::MachineConfig;
use crate::core::State;
use crate::error::HfsmError;
use crate::machine::Machine;
use crate::validation::{check_table, combine, into_result, Checked, Violation};
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use tracing::debug;

pub mod error;
pub mod registry;

pub use error::BlueprintError;
pub use registry::Registry;

/// Version identifier for the blueprint format
pub const BLUEPRINT_VERSION: u32 = 1;

fn current_version() -> u32 {
    BLUEPRINT_VERSION
}

/// Serializable description of a machine and its children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Blueprint format version. Only meaningful on the root.
    #[serde(default = "current_version")]
    pub version: u32,

    pub name: String,

    /// Registered behavior run as this machine's own hooks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<MachineConfig>,

    #[serde(default)]
    pub states: Vec<StateBlueprint>,

    #[serde(default)]
    pub transitions: Vec<TransitionBlueprint>,
}

/// One entry of a blueprint's state table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateBlueprint {
    State {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        behavior: Option<String>,
    },
    Machine(Blueprint),
}

impl StateBlueprint {
    pub fn name(&self) -> &str {
        match self {
            StateBlueprint::State { name, .. } => name,
            StateBlueprint::Machine(blueprint) => &blueprint.name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionBlueprint {
    pub from: String,
    pub to: String,
    /// Registered guard; none means the transition always fires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
}

impl Blueprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: BLUEPRINT_VERSION,
            name: name.into(),
            behavior: None,
            config: None,
            states: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Add a leaf state.
    pub fn with_state(mut self, name: impl Into<String>) -> Self {
        self.states.push(StateBlueprint::State {
            name: name.into(),
            behavior: None,
        });
        self
    }

    /// Add a leaf state running a registered behavior.
    pub fn with_state_behavior(mut self, name: impl Into<String>, behavior: impl Into<String>) -> Self {
        self.states.push(StateBlueprint::State {
            name: name.into(),
            behavior: Some(behavior.into()),
        });
        self
    }

    /// Add a nested machine.
    pub fn with_machine(mut self, machine: Blueprint) -> Self {
        self.states.push(StateBlueprint::Machine(machine));
        self
    }

    pub fn with_transition(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.transitions.push(TransitionBlueprint {
            from: from.into(),
            to: to.into(),
            guard: None,
        });
        self
    }

    pub fn with_guarded_transition(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        guard: impl Into<String>,
    ) -> Self {
        self.transitions.push(TransitionBlueprint {
            from: from.into(),
            to: to.into(),
            guard: Some(guard.into()),
        });
        self
    }

    /// Set this machine's own hooks from a registered behavior.
    pub fn with_behavior(mut self, behavior: impl Into<String>) -> Self {
        self.behavior = Some(behavior.into());
        self
    }

    pub fn with_config(mut self, config: MachineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Parse a blueprint from JSON.
    pub fn from_json(json: &str) -> Result<Self, BlueprintError> {
        let blueprint: Blueprint = serde_json::from_str(json)?;
        if blueprint.version > BLUEPRINT_VERSION {
            return Err(BlueprintError::UnsupportedVersion {
                found: blueprint.version,
                supported: BLUEPRINT_VERSION,
            });
        }
        Ok(blueprint)
    }

    pub fn to_json(&self) -> Result<String, BlueprintError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the whole tree against `registry`, collecting every problem:
    /// reserved or duplicate state names, transitions to undeclared states,
    /// and guards or behaviors that are not registered.
    pub fn validate<C: 'static>(&self, registry: &Registry<C>) -> Checked {
        let names: Vec<&str> = self.states.iter().map(StateBlueprint::name).collect();
        let edges: Vec<(&str, &str)> = self
            .transitions
            .iter()
            .map(|t| (t.from.as_str(), t.to.as_str()))
            .collect();

        let mut checks = vec![check_table(&names, &edges)];
        checks.push(check_behavior(&self.name, self.behavior.as_deref(), registry));

        for transition in &self.transitions {
            if let Some(guard) = &transition.guard {
                if !registry.has_guard(guard) {
                    checks.push(Validation::fail(Violation::UnknownGuard {
                        from: transition.from.clone(),
                        to: transition.to.clone(),
                        guard: guard.clone(),
                    }));
                }
            }
        }

        for state in &self.states {
            match state {
                StateBlueprint::State { name, behavior } => {
                    checks.push(check_behavior(name, behavior.as_deref(), registry));
                }
                StateBlueprint::Machine(child) => checks.push(child.validate(registry)),
            }
        }

        combine(checks)
    }

    /// Validate the blueprint and build a root machine owning `context`.
    ///
    /// Nothing is built unless the whole tree is valid.
    pub fn instantiate<C: 'static>(
        &self,
        context: C,
        registry: &Registry<C>,
    ) -> Result<Machine<C>, BlueprintError> {
        into_result(self.validate(registry)).map_err(BlueprintError::Invalid)?;

        let mut machine = Machine::new(self.name.clone(), context);
        self.populate(&mut machine, registry)?;
        debug!(
            machine = machine.name(),
            states = machine.state_count(),
            "blueprint instantiated"
        );
        Ok(machine)
    }

    fn populate<C: 'static>(
        &self,
        machine: &mut Machine<C>,
        registry: &Registry<C>,
    ) -> Result<(), HfsmError> {
        for state in &self.states {
            match state {
                StateBlueprint::State { name, behavior } => {
                    let state = match behavior.as_deref().and_then(|b| registry.behavior(b)) {
                        Some(behavior) => State::with_behavior(name.clone(), behavior),
                        None => State::new(name.clone()),
                    };
                    machine.add_state(state)?;
                }
                StateBlueprint::Machine(child) => {
                    let mut nested = child.shell(registry);
                    child.populate(&mut nested, registry)?;
                    machine.add_state(nested)?;
                }
            }
        }

        for transition in &self.transitions {
            let guard = transition.guard.as_deref().and_then(|g| registry.guard(g));
            machine.add_transition(&transition.from, &transition.to, guard)?;
        }
        Ok(())
    }

    /// An empty nested machine carrying this blueprint's own hooks and
    /// config.
    fn shell<C: 'static>(&self, registry: &Registry<C>) -> Machine<C> {
        let mut machine = Machine::nested(self.name.clone());
        if let Some(behavior) = self.behavior.as_deref().and_then(|b| registry.behavior(b)) {
            machine = machine.with_behavior(behavior);
        }
        if let Some(config) = self.config.clone() {
            machine = machine.with_config(config);
        }
        machine
    }
}

fn check_behavior<C: 'static>(state: &str, behavior: Option<&str>, registry: &Registry<C>) -> Checked {
    match behavior {
        Some(behavior) if !registry.has_behavior(behavior) => {
            Validation::fail(Violation::UnknownBehavior {
                state: state.to_string(),
                behavior: behavior.to_string(),
            })
        }
        _ => Validation::success(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Callbacks;
    use crate::machine::{ANY, ENTER};
    use std::time::Duration;

    #[derive(Default)]
    struct World {
        enemy_visible: bool,
        steps: u32,
    }

    fn registry() -> Registry<World> {
        Registry::new()
            .with_guard("enemy_visible", |w: &World| w.enemy_visible)
            .with_guard("all_clear", |w: &World| !w.enemy_visible)
            .with_behavior("walk", || {
                Callbacks::new().on_update(|_, w: &mut World| w.steps += 1)
            })
    }

    fn guard_blueprint() -> Blueprint {
        Blueprint::new("guard")
            .with_state_behavior("patrol", "walk")
            .with_machine(
                Blueprint::new("combat")
                    .with_state("attack")
                    .with_transition(ENTER, "attack"),
            )
            .with_transition(ENTER, "patrol")
            .with_guarded_transition("patrol", "combat", "enemy_visible")
            .with_guarded_transition("combat", "patrol", "all_clear")
    }

    #[test]
    fn instantiate_builds_tree() {
        let mut machine = guard_blueprint()
            .instantiate(World::default(), &registry())
            .unwrap();

        assert!(machine.has_state("patrol"));
        assert!(machine.get("combat").unwrap().is_machine());

        machine.update(Duration::from_millis(16)).unwrap();
        assert_eq!(machine.current_name(), "patrol");
        machine.update(Duration::from_millis(16)).unwrap();
        assert_eq!(machine.context().unwrap().steps, 1);

        machine.context_mut().unwrap().enemy_visible = true;
        machine.update(Duration::from_millis(16)).unwrap();
        assert_eq!(machine.current_name(), "combat");

        machine.update(Duration::from_millis(16)).unwrap();
        let combat = machine.get("combat").and_then(|n| n.as_machine()).unwrap();
        assert_eq!(combat.current_name(), "attack");
    }

    #[test]
    fn json_round_trip() {
        let blueprint = guard_blueprint();
        let json = blueprint.to_json().unwrap();

        assert!(json.contains("\"kind\": \"machine\""));
        assert_eq!(Blueprint::from_json(&json).unwrap(), blueprint);
    }

    #[test]
    fn from_json_applies_defaults() {
        let blueprint = Blueprint::from_json(
            r#"{ "name": "door", "states": [{ "kind": "state", "name": "open" }] }"#,
        )
        .unwrap();

        assert_eq!(blueprint.version, BLUEPRINT_VERSION);
        assert!(blueprint.transitions.is_empty());
        assert_eq!(blueprint.states[0].name(), "open");
    }

    #[test]
    fn from_json_rejects_malformed_input() {
        let result = Blueprint::from_json(r#"{ "states": [] }"#);
        assert!(matches!(result, Err(BlueprintError::Parse(_))));

        let result = Blueprint::from_json(r#"{ "name": "x", "states": [{ "kind": "blob" }] }"#);
        assert!(matches!(result, Err(BlueprintError::Parse(_))));
    }

    #[test]
    fn from_json_rejects_newer_versions() {
        let result = Blueprint::from_json(r#"{ "version": 99, "name": "x" }"#);

        assert!(matches!(
            result,
            Err(BlueprintError::UnsupportedVersion {
                found: 99,
                supported: BLUEPRINT_VERSION
            })
        ));
    }

    #[test]
    fn validate_collects_every_violation() {
        let blueprint = Blueprint::new("bad")
            .with_behavior("fly")
            .with_state(ANY)
            .with_state("a")
            .with_machine(
                Blueprint::new("sub")
                    .with_state_behavior("b", "swim")
                    .with_transition("b", "nowhere"),
            )
            .with_guarded_transition("a", "sub", "unknown_guard");

        let violations = match blueprint.validate(&registry()) {
            Validation::Failure(errors) => errors.iter().cloned().collect::<Vec<_>>(),
            Validation::Success(_) => panic!("Expected failures, got success"),
        };

        assert_eq!(violations.len(), 5);
        assert!(violations.contains(&Violation::ReservedName {
            name: ANY.to_string()
        }));
        assert!(violations.contains(&Violation::UnknownBehavior {
            state: "bad".to_string(),
            behavior: "fly".to_string()
        }));
        assert!(violations.contains(&Violation::UnknownBehavior {
            state: "b".to_string(),
            behavior: "swim".to_string()
        }));
        assert!(violations.contains(&Violation::UnknownGuard {
            from: "a".to_string(),
            to: "sub".to_string(),
            guard: "unknown_guard".to_string()
        }));
        assert!(violations.contains(&Violation::UnknownEndpoint {
            from: "b".to_string(),
            to: "nowhere".to_string(),
            missing: "nowhere".to_string()
        }));
    }

    #[test]
    fn invalid_blueprint_is_not_instantiated() {
        let blueprint = Blueprint::new("bad").with_state(ENTER);

        let err = blueprint
            .instantiate(World::default(), &registry())
            .unwrap_err();

        assert_eq!(
            err.violations(),
            &[Violation::ReservedName {
                name: ENTER.to_string()
            }]
        );
    }

    #[test]
    fn nested_config_is_applied() {
        let blueprint = Blueprint::new("root").with_machine(
            Blueprint::new("sub").with_config(MachineConfig::default().with_settle_limit(2)),
        );

        let machine = blueprint.instantiate(World::default(), &registry()).unwrap();
        let sub = machine.get("sub").and_then(|n| n.as_machine()).unwrap();

        assert_eq!(sub.config().settle_limit, 2);
    }
}
