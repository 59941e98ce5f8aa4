//! Stable handles for machines and the states they own.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a single [`Machine`](crate::Machine).
///
/// Minted once at construction. Two machines never share an id, even when
/// they carry the same name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineId(Uuid);

impl MachineId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying uuid.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to an entry in a machine's state table.
///
/// A handle is only meaningful to the machine that minted it. Handles stay
/// valid while the entry is registered. The slot of a removed entry is
/// reused under a new generation, so an old handle never resolves to the
/// entry that took its place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateId {
    machine: MachineId,
    index: usize,
    generation: u32,
}

impl StateId {
    pub(crate) fn new(machine: MachineId, index: usize) -> Self {
        Self::versioned(machine, index, 0)
    }

    pub(crate) fn versioned(machine: MachineId, index: usize, generation: u32) -> Self {
        Self {
            machine,
            index,
            generation,
        }
    }

    /// The machine whose table this handle points into.
    pub fn machine(&self) -> MachineId {
        self.machine
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}.{}", self.machine, self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_ids_are_unique() {
        assert_ne!(MachineId::new(), MachineId::new());
    }

    #[test]
    fn state_id_equality_includes_machine() {
        let a = MachineId::new();
        let b = MachineId::new();

        assert_eq!(StateId::new(a, 3), StateId::new(a, 3));
        assert_ne!(StateId::new(a, 3), StateId::new(b, 3));
        assert_eq!(StateId::new(a, 3).machine(), a);
    }

    #[test]
    fn state_id_equality_includes_generation() {
        let machine = MachineId::new();

        assert_ne!(StateId::new(machine, 2), StateId::versioned(machine, 2, 1));
        assert_eq!(StateId::versioned(machine, 2, 1).generation(), 1);
        assert!(StateId::versioned(machine, 2, 1).to_string().ends_with("#2.1"));
    }

    #[test]
    fn machine_id_serializes_correctly() {
        let id = MachineId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: MachineId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
