//! hfsm: hierarchical finite state machines for per-frame simulation
//!
//! A [`Machine`] owns a table of named states and guarded transitions and is
//! driven by calling [`Machine::update`] once per tick with the elapsed time.
//! A machine is itself a state, so machines nest: a parent only ticks the
//! child machine it currently has selected, and that child ticks its own
//! current state in turn.
//!
//! # Core Concepts
//!
//! - **States**: named leaves with `on_enter`, `on_update` and `on_exit` hooks
//! - **Guards**: predicates over the shared context that gate transitions
//! - **ENTER / ANY**: reserved pseudo-states for the initial state and for
//!   transitions checked on every tick
//! - **Diagnostics**: wiring mistakes are returned and reported, never fatal
//!
//! # Example
//!
//! ```rust
//! use hfsm::{Callbacks, Machine, State, ANY, ENTER};
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct Npc {
//!     health: i32,
//!     sees_player: bool,
//!     log: Vec<String>,
//! }
//!
//! let mut combat = Machine::nested("combat");
//! combat.add_state(State::new("attack")).unwrap();
//! combat.add_transition(ENTER, "attack", None).unwrap();
//!
//! let mut npc = Machine::new("npc", Npc { health: 10, ..Default::default() });
//! npc.add_state(State::with_behavior(
//!     "patrol",
//!     Callbacks::new().on_enter(|_, npc: &mut Npc| npc.log.push("patrolling".into())),
//! ))
//! .unwrap();
//! npc.add_state(combat).unwrap();
//! npc.add_state(State::new("dead")).unwrap();
//!
//! npc.add_transition(ENTER, "patrol", None).unwrap();
//! npc.add_guarded_transition("patrol", "combat", |n: &Npc| n.sees_player).unwrap();
//! npc.add_guarded_transition(ANY, "dead", |n: &Npc| n.health <= 0).unwrap();
//!
//! let dt = Duration::from_millis(16);
//! npc.update(dt).unwrap();
//! assert_eq!(npc.current_name(), "patrol");
//!
//! npc.context_mut().unwrap().sees_player = true;
//! npc.update(dt).unwrap();
//! assert_eq!(npc.current_name(), "combat");
//!
//! npc.context_mut().unwrap().health = 0;
//! npc.update(dt).unwrap();
//! assert_eq!(npc.current_name(), "dead");
//! ```

pub mod blueprint;
pub mod builder;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod machine;
pub mod validation;

// Re-export commonly used types
pub use blueprint::{Blueprint, BlueprintError, Registry};
pub use builder::{BuildError, MachineBuilder, TransitionBuilder, TransitionSpec};
pub use config::MachineConfig;
pub use core::{
    Behavior, Callbacks, Guard, MachineId, NoopBehavior, State, StateId, Transition,
    TransitionLog, TransitionRecord,
};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, TracingSink};
pub use error::HfsmError;
pub use machine::{is_reserved, Machine, Node, ANY, ENTER};
pub use validation::Violation;
