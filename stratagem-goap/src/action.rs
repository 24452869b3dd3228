use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::state::{EffectExpr, GoalState, PrecondExpr, WorldState};

/// Result of polling a running action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    Running,
    Success,
    Failure,
}

/// A capability the agent can schedule.
///
/// The declarative surface (preconditions, effects, cost, commit policy)
/// drives the backward search; the lifecycle hooks drive execution. Hooks
/// default to the cheapest useful behavior so purely declarative actions
/// only implement the first three methods (or use [`StaticAction`]).
///
/// Goal-state arguments are the step's snapshot: the partial goal state
/// captured when the action was selected during search, carrying concrete
/// bindings for `Any` effects and resolved `Ref` preconditions.
pub trait Action {
    fn name(&self) -> &str;

    fn preconditions(&self) -> &BTreeMap<String, PrecondExpr>;

    fn effects(&self) -> &BTreeMap<String, EffectExpr>;

    fn cost(&self) -> f32 {
        1.0
    }

    /// When true (the default), effects are committed to the world only
    /// after the action exits successfully. When false, effects are
    /// committed immediately after `on_enter`, for actions whose outcome
    /// is established by external machinery while the step is running.
    fn apply_effects_on_exit(&self) -> bool {
        true
    }

    /// Runtime filter consulted during planning (`is_planning = true`) and
    /// again as part of each tick's validity check during execution.
    fn check_procedural_precondition(
        &self,
        _world: &WorldState,
        _goal_state: &GoalState,
        _is_planning: bool,
    ) -> bool {
        true
    }

    /// Called once when the step becomes active.
    fn on_enter(&mut self, _world: &mut WorldState, _goal_state: &GoalState) {}

    /// Polled each executor tick while the step is active.
    fn get_status(&mut self, _world: &mut WorldState, _goal_state: &GoalState) -> ActionStatus {
        ActionStatus::Success
    }

    /// Called once when the step leaves `Running`.
    fn on_exit(&mut self, _world: &mut WorldState, _goal_state: &GoalState) {}

    /// Wrap this action in the shared handle the planner registers.
    fn into_handle(self) -> ActionHandle
    where
        Self: Sized + 'static,
    {
        Rc::new(RefCell::new(self))
    }
}

/// Shared handle to a registered action.
///
/// The planner owns the registry and every plan step holds a handle to its
/// action, so stateful hooks (`&mut self`) work across the single-threaded
/// tick without the host juggling borrows.
pub type ActionHandle = Rc<RefCell<dyn Action>>;

/// Purely declarative action: all lifecycle hooks keep their defaults.
///
/// Covers the common case of actions whose execution is instantaneous
/// (`get_status` returns `Success` on the first poll) and also serves as a
/// building block in tests.
#[derive(Debug, Clone)]
pub struct StaticAction {
    name: String,
    preconditions: BTreeMap<String, PrecondExpr>,
    effects: BTreeMap<String, EffectExpr>,
    cost: f32,
    apply_effects_on_exit: bool,
}

impl StaticAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preconditions: BTreeMap::new(),
            effects: BTreeMap::new(),
            cost: 1.0,
            apply_effects_on_exit: true,
        }
    }

    pub fn with_precondition(
        mut self,
        key: impl Into<String>,
        expr: impl Into<PrecondExpr>,
    ) -> Self {
        self.preconditions.insert(key.into(), expr.into());
        self
    }

    pub fn with_effect(mut self, key: impl Into<String>, expr: impl Into<EffectExpr>) -> Self {
        self.effects.insert(key.into(), expr.into());
        self
    }

    pub fn with_cost(mut self, cost: f32) -> Self {
        self.cost = cost;
        self
    }

    /// Commit effects right after `on_enter` instead of on successful exit.
    pub fn with_immediate_effects(mut self) -> Self {
        self.apply_effects_on_exit = false;
        self
    }
}

impl Action for StaticAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn preconditions(&self) -> &BTreeMap<String, PrecondExpr> {
        &self.preconditions
    }

    fn effects(&self) -> &BTreeMap<String, EffectExpr> {
        &self.effects
    }

    fn cost(&self) -> f32 {
        self.cost
    }

    fn apply_effects_on_exit(&self) -> bool {
        self.apply_effects_on_exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Value;

    #[test]
    fn builder_and_defaults() {
        let action = StaticAction::new("reload")
            .with_precondition("has_ammo", true)
            .with_effect("weapon_is_loaded", true);

        assert_eq!(action.name(), "reload");
        assert_eq!(action.cost(), 1.0);
        assert!(action.apply_effects_on_exit());
        assert_eq!(
            action.preconditions().get("has_ammo"),
            Some(&PrecondExpr::Value(Value::Bool(true)))
        );
        assert_eq!(
            action.effects().get("weapon_is_loaded"),
            Some(&EffectExpr::Value(Value::Bool(true)))
        );
    }

    #[test]
    fn default_status_is_success() {
        let mut action = StaticAction::new("noop");
        let mut world = WorldState::new();
        let snapshot = GoalState::new();
        assert_eq!(
            action.get_status(&mut world, &snapshot),
            ActionStatus::Success
        );
    }

    #[test]
    fn immediate_effects_flag() {
        let chase = StaticAction::new("chase")
            .with_effect("in_weapons_range", true)
            .with_immediate_effects();
        assert!(!chase.apply_effects_on_exit());
    }

    #[test]
    fn symbolic_effect_declaration() {
        let goto = StaticAction::new("go_to").with_effect("at_location", EffectExpr::Any);
        assert_eq!(goto.effects().get("at_location"), Some(&EffectExpr::Any));
    }
}
