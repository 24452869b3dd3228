// Auxiliary finite-state machine for domain code: hosts use it to drive
// concurrent low-level behaviors (pathing, animation) underneath a plan.
// Nothing in the planner, executor, or director depends on it.

use std::collections::BTreeMap;

use crate::state::WorldState;

/// One low-level behavior slot. States communicate with actions through
/// world-state keys, never by direct reference.
pub trait FsmState {
    fn name(&self) -> &str;

    /// Called once per host tick while this state is active.
    fn update(&mut self, world: &mut WorldState);
}

/// Named-state registry with a single active state.
#[derive(Default)]
pub struct StateMachine {
    states: BTreeMap<String, Box<dyn FsmState>>,
    active: Option<String>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            states: BTreeMap::new(),
            active: None,
        }
    }

    /// Register a state. The first registered state becomes active.
    pub fn add_state(&mut self, state: Box<dyn FsmState>) {
        let name = state.name().to_string();
        if self.active.is_none() {
            self.active = Some(name.clone());
        }
        self.states.insert(name, state);
    }

    /// Switch the active state. Returns false when no such state exists.
    pub fn set_active(&mut self, name: &str) -> bool {
        if self.states.contains_key(name) {
            self.active = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Tick the active state.
    pub fn update(&mut self, world: &mut WorldState) {
        if let Some(name) = &self.active {
            if let Some(state) = self.states.get_mut(name) {
                state.update(world);
            }
        }
    }
}
