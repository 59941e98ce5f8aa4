//! Hierarchical machines.
//!
//! A [`Machine`] owns a table of [`Node`]s, each a leaf state or another
//! machine, and drives them:
//!
//! - **Table**: named entries behind stable handles, plus the reserved
//!   `ENTER` and `ANY` pseudo-states
//! - **Transitions**: guarded edges between siblings, evaluated first-match
//! - **Update**: ticks only the active branch of the tree, root to leaf

#[allow(clippy::module_inception)]
mod machine;
mod node;
mod update;

pub use machine::{is_reserved, Machine, ANY, ENTER};
pub use node::Node;
