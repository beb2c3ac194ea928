//! Execution environment for the Clot interpreter.

use std::collections::HashMap;

use super::value::VariableSlot;

/// Flat identifier-to-slot map. Function calls swap whole environments in
/// and out rather than pushing scopes, so a single map is all that's needed.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    slots: HashMap<String, VariableSlot>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace a slot
    pub fn define(&mut self, name: impl Into<String>, slot: VariableSlot) {
        self.slots.insert(name.into(), slot);
    }

    /// Look up a slot
    pub fn get(&self, name: &str) -> Option<&VariableSlot> {
        self.slots.get(name)
    }

    /// Mutable slot lookup
    pub fn get_mut(&mut self, name: &str) -> Option<&mut VariableSlot> {
        self.slots.get_mut(name)
    }

    /// Remove a slot, returning it if present
    pub fn remove(&mut self, name: &str) -> Option<VariableSlot> {
        self.slots.remove(name)
    }
}
