//! Core building blocks of a machine tree.
//!
//! This module contains the leaf-level types:
//! - Handles for machines and states
//! - Guard predicates over the shared context
//! - Lifecycle hooks via the `Behavior` trait
//! - Leaf states and their transitions
//! - The bounded transition log

mod behavior;
mod guard;
mod history;
mod id;
mod state;
mod transition;

pub use behavior::{Behavior, Callbacks, NoopBehavior};
pub use guard::Guard;
pub use history::{TransitionLog, TransitionRecord};
pub use id::{MachineId, StateId};
pub use state::State;
pub use transition::Transition;
