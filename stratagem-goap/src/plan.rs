use serde::{Deserialize, Serialize};

use crate::action::{ActionHandle, ActionStatus};
use crate::error::PlanFailure;
use crate::state::{EffectExpr, GoalState, WorldState};

/// Overall status of a plan in execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStatus {
    Running,
    Success,
    Failure,
}

/// One scheduled action plus the goal-state snapshot captured when the
/// backward search selected it. The snapshot carries concrete bindings for
/// `Any` effects and is what every lifecycle hook sees.
pub struct PlanStep {
    action: ActionHandle,
    snapshot: GoalState,
    entered: bool,
}

impl std::fmt::Debug for PlanStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanStep")
            .field("action", &self.action.borrow().name())
            .field("snapshot", &self.snapshot)
            .field("entered", &self.entered)
            .finish()
    }
}

impl PlanStep {
    pub(crate) fn new(action: ActionHandle, snapshot: GoalState) -> Self {
        Self {
            action,
            snapshot,
            entered: false,
        }
    }

    pub fn action_name(&self) -> String {
        self.action.borrow().name().to_string()
    }

    /// Handle to the step's action, for inspection.
    pub fn action(&self) -> ActionHandle {
        std::rc::Rc::clone(&self.action)
    }

    pub fn snapshot(&self) -> &GoalState {
        &self.snapshot
    }

    pub fn cost(&self) -> f32 {
        self.action.borrow().cost()
    }

    /// Check this step against the live world: the procedural precondition
    /// (with `is_planning = false`) and every declared precondition, with
    /// references resolved through the snapshot.
    fn validity_violation(&self, world: &WorldState) -> Option<PlanFailure> {
        let action = self.action.borrow();

        if !action.check_procedural_precondition(world, &self.snapshot, false) {
            return Some(PlanFailure::ProceduralInvalidated {
                action: action.name().to_string(),
            });
        }

        for (key, expr) in action.preconditions() {
            let holds = expr
                .resolve(&self.snapshot)
                .map_or(false, |required| world.get(key) == Some(required));
            if !holds {
                return Some(PlanFailure::PreconditionInvalidated {
                    action: action.name().to_string(),
                    key: key.clone(),
                });
            }
        }

        None
    }

    /// Write the action's effects into the world. Concrete values go in as
    /// declared; `Any` writes the snapshot binding.
    fn commit_effects(&self, world: &mut WorldState) {
        let action = self.action.borrow();
        for (key, effect) in action.effects() {
            match effect {
                EffectExpr::Value(v) => world.set(key, v.clone()),
                EffectExpr::Any => match self.snapshot.get(key) {
                    Some(bound) => world.set(key, bound.clone()),
                    // Nothing demanded this key, so there is nothing to
                    // write.
                    None => tracing::debug!(key = %key, "skipping unbound symbolic effect"),
                },
            }
        }
    }
}

/// An ordered action sequence in execution: steps, a cursor, and a sticky
/// terminal status. Drive it by polling [`Plan::update`] once per host tick.
#[derive(Debug)]
pub struct Plan {
    steps: Vec<PlanStep>,
    cursor: usize,
    status: PlanStatus,
    label: String,
    failure: Option<PlanFailure>,
}

impl Plan {
    pub(crate) fn new(steps: Vec<PlanStep>) -> Self {
        Self {
            steps,
            cursor: 0,
            status: PlanStatus::Running,
            label: "plan".to_string(),
            failure: None,
        }
    }

    pub(crate) fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Read-only view of the ordered steps, for inspection and rendering.
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn status(&self) -> PlanStatus {
        self.status
    }

    /// Goal name this plan was built for.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Why the plan failed, when `status()` is `Failure`.
    pub fn failure(&self) -> Option<&PlanFailure> {
        self.failure.as_ref()
    }

    pub fn total_cost(&self) -> f32 {
        self.steps.iter().map(|s| s.cost()).sum()
    }

    /// Advance the current step by one lifecycle transition.
    ///
    /// Per tick: re-validate the step against the live world, then either
    /// enter it or poll its status. Terminal statuses are sticky; further
    /// calls return them unchanged.
    pub fn update(&mut self, world: &mut WorldState) -> PlanStatus {
        if self.status != PlanStatus::Running {
            return self.status;
        }

        let Some(step) = self.steps.get_mut(self.cursor) else {
            self.status = PlanStatus::Success;
            return self.status;
        };

        if let Some(failure) = step.validity_violation(world) {
            // Exit symmetry: an already-entered step still gets on_exit
            // when invalidation tears the plan down.
            if step.entered {
                step.action.borrow_mut().on_exit(world, &step.snapshot);
            }
            tracing::debug!(plan = %self.label, %failure, "plan invalidated");
            self.failure = Some(failure);
            self.status = PlanStatus::Failure;
            return self.status;
        }

        if !step.entered {
            step.action.borrow_mut().on_enter(world, &step.snapshot);
            step.entered = true;
            if !step.action.borrow().apply_effects_on_exit() {
                step.commit_effects(world);
            }
            tracing::debug!(plan = %self.label, action = %step.action_name(), "step entered");
            return PlanStatus::Running;
        }

        let status = step.action.borrow_mut().get_status(world, &step.snapshot);
        match status {
            ActionStatus::Running => PlanStatus::Running,
            ActionStatus::Failure => {
                step.action.borrow_mut().on_exit(world, &step.snapshot);
                tracing::debug!(plan = %self.label, action = %step.action_name(), "step failed");
                self.failure = Some(PlanFailure::ActionFailed {
                    action: step.action_name(),
                });
                self.status = PlanStatus::Failure;
                self.status
            }
            ActionStatus::Success => {
                step.action.borrow_mut().on_exit(world, &step.snapshot);
                if step.action.borrow().apply_effects_on_exit() {
                    step.commit_effects(world);
                }
                self.cursor += 1;
                if self.cursor == self.steps.len() {
                    tracing::debug!(plan = %self.label, "plan complete");
                    self.status = PlanStatus::Success;
                }
                self.status
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, StaticAction};
    use crate::planner::Planner;
    use crate::state::{PrecondExpr, Value};
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    /// Action that records every hook invocation into a shared journal.
    struct Recording {
        name: String,
        preconditions: BTreeMap<String, PrecondExpr>,
        effects: BTreeMap<String, EffectExpr>,
        apply_on_exit: bool,
        ticks_until_done: u32,
        journal: Rc<RefCell<Vec<String>>>,
    }

    impl Recording {
        fn new(name: &str, journal: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                preconditions: BTreeMap::new(),
                effects: BTreeMap::new(),
                apply_on_exit: true,
                ticks_until_done: 0,
                journal: Rc::clone(journal),
            }
        }

        fn log(&self, event: &str) {
            self.journal.borrow_mut().push(format!("{}:{}", self.name, event));
        }
    }

    impl Action for Recording {
        fn name(&self) -> &str {
            &self.name
        }

        fn preconditions(&self) -> &BTreeMap<String, PrecondExpr> {
            &self.preconditions
        }

        fn effects(&self) -> &BTreeMap<String, EffectExpr> {
            &self.effects
        }

        fn apply_effects_on_exit(&self) -> bool {
            self.apply_on_exit
        }

        fn on_enter(&mut self, _world: &mut WorldState, _goal_state: &GoalState) {
            self.log("enter");
        }

        fn get_status(&mut self, _world: &mut WorldState, _goal_state: &GoalState) -> ActionStatus {
            self.log("poll");
            if self.ticks_until_done > 0 {
                self.ticks_until_done -= 1;
                ActionStatus::Running
            } else {
                ActionStatus::Success
            }
        }

        fn on_exit(&mut self, _world: &mut WorldState, _goal_state: &GoalState) {
            self.log("exit");
        }
    }

    fn drive(plan: &mut Plan, world: &mut WorldState, max_ticks: usize) -> PlanStatus {
        for _ in 0..max_ticks {
            let status = plan.update(world);
            if status != PlanStatus::Running {
                return status;
            }
        }
        PlanStatus::Running
    }

    #[test]
    fn lifecycle_order_per_step() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let mut world = WorldState::new().with("done", false);

        let mut action = Recording::new("work", &journal);
        action.effects.insert("done".to_string(), EffectExpr::from(true));
        action.ticks_until_done = 2;

        let planner = Planner::new(
            vec![Rc::new(RefCell::new(action)) as ActionHandle],
            &world,
        )
        .unwrap();
        let goal: GoalState = [("done".to_string(), Value::Bool(true))].into();
        let mut plan = planner.plan(&world, &goal).unwrap();

        let status = drive(&mut plan, &mut world, 10);
        assert_eq!(status, PlanStatus::Success);
        assert_eq!(
            *journal.borrow(),
            [
                "work:enter",
                "work:poll",
                "work:poll",
                "work:poll",
                "work:exit"
            ]
        );
        assert_eq!(world.get("done"), Some(&Value::Bool(true)));
    }

    #[test]
    fn effects_commit_after_exit_by_default() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let mut world = WorldState::new().with("done", false);

        let mut action = Recording::new("work", &journal);
        action.effects.insert("done".to_string(), EffectExpr::from(true));

        let planner = Planner::new(
            vec![Rc::new(RefCell::new(action)) as ActionHandle],
            &world,
        )
        .unwrap();
        let goal: GoalState = [("done".to_string(), Value::Bool(true))].into();
        let mut plan = planner.plan(&world, &goal).unwrap();

        plan.update(&mut world); // enter
        assert_eq!(world.get("done"), Some(&Value::Bool(false)));
        plan.update(&mut world); // poll -> success, exit, commit
        assert_eq!(world.get("done"), Some(&Value::Bool(true)));
    }

    #[test]
    fn immediate_effects_commit_on_entry() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let mut world = WorldState::new().with("in_range", false);

        let mut chase = Recording::new("chase", &journal);
        chase
            .effects
            .insert("in_range".to_string(), EffectExpr::from(true));
        chase.apply_on_exit = false;
        chase.ticks_until_done = 3;

        let planner = Planner::new(
            vec![Rc::new(RefCell::new(chase)) as ActionHandle],
            &world,
        )
        .unwrap();
        let goal: GoalState = [("in_range".to_string(), Value::Bool(true))].into();
        let mut plan = planner.plan(&world, &goal).unwrap();

        plan.update(&mut world); // enter + immediate commit
        assert_eq!(world.get("in_range"), Some(&Value::Bool(true)));
        assert_eq!(plan.status(), PlanStatus::Running);
    }

    #[test]
    fn action_failure_fails_the_plan_after_exit() {
        struct Failing {
            preconditions: BTreeMap<String, PrecondExpr>,
            effects: BTreeMap<String, EffectExpr>,
            exited: Rc<RefCell<bool>>,
        }

        impl Action for Failing {
            fn name(&self) -> &str {
                "failing"
            }
            fn preconditions(&self) -> &BTreeMap<String, PrecondExpr> {
                &self.preconditions
            }
            fn effects(&self) -> &BTreeMap<String, EffectExpr> {
                &self.effects
            }
            fn get_status(
                &mut self,
                _world: &mut WorldState,
                _goal_state: &GoalState,
            ) -> ActionStatus {
                ActionStatus::Failure
            }
            fn on_exit(&mut self, _world: &mut WorldState, _goal_state: &GoalState) {
                *self.exited.borrow_mut() = true;
            }
        }

        let exited = Rc::new(RefCell::new(false));
        let mut world = WorldState::new().with("done", false);

        let action = Failing {
            preconditions: BTreeMap::new(),
            effects: [("done".to_string(), EffectExpr::from(true))].into(),
            exited: Rc::clone(&exited),
        };

        let planner = Planner::new(
            vec![Rc::new(RefCell::new(action)) as ActionHandle],
            &world,
        )
        .unwrap();
        let goal: GoalState = [("done".to_string(), Value::Bool(true))].into();
        let mut plan = planner.plan(&world, &goal).unwrap();

        let status = drive(&mut plan, &mut world, 5);
        assert_eq!(status, PlanStatus::Failure);
        assert!(*exited.borrow());
        assert!(matches!(
            plan.failure(),
            Some(PlanFailure::ActionFailed { action }) if action == "failing"
        ));
        // Failed action never committed its effects.
        assert_eq!(world.get("done"), Some(&Value::Bool(false)));
    }

    #[test]
    fn invalidated_precondition_fails_the_plan() {
        let mut world = WorldState::new().with("has_axe", false).with("has_wood", false);

        let actions = vec![
            StaticAction::new("get_axe")
                .with_effect("has_axe", true)
                .into_handle(),
            StaticAction::new("cut_trees")
                .with_precondition("has_axe", true)
                .with_effect("has_wood", true)
                .into_handle(),
        ];

        let planner = Planner::new(actions, &world).unwrap();
        let goal: GoalState = [("has_wood".to_string(), Value::Bool(true))].into();
        let mut plan = planner.plan(&world, &goal).unwrap();

        // Run get_axe to completion (enter, then poll -> success).
        plan.update(&mut world);
        plan.update(&mut world);
        assert_eq!(world.get("has_axe"), Some(&Value::Bool(true)));

        // The world shifts under the plan before cut_trees enters.
        world.set("has_axe", Value::Bool(false));

        let status = plan.update(&mut world);
        assert_eq!(status, PlanStatus::Failure);
        assert!(matches!(
            plan.failure(),
            Some(PlanFailure::PreconditionInvalidated { action, key })
                if action == "cut_trees" && key == "has_axe"
        ));
    }

    #[test]
    fn terminal_status_is_sticky() {
        let mut world = WorldState::new().with("done", false);
        let actions = vec![StaticAction::new("finish")
            .with_effect("done", true)
            .into_handle()];

        let planner = Planner::new(actions, &world).unwrap();
        let goal: GoalState = [("done".to_string(), Value::Bool(true))].into();
        let mut plan = planner.plan(&world, &goal).unwrap();

        assert_eq!(drive(&mut plan, &mut world, 10), PlanStatus::Success);

        // Sabotage the world; a finished plan must not care.
        world.set("done", Value::Bool(false));
        assert_eq!(plan.update(&mut world), PlanStatus::Success);
        assert_eq!(plan.update(&mut world), PlanStatus::Success);
        assert_eq!(world.get("done"), Some(&Value::Bool(false)));
    }

    #[test]
    fn empty_plan_succeeds_immediately() {
        let mut world = WorldState::new().with("safe", true);
        let planner = Planner::new(Vec::new(), &world).unwrap();
        let goal: GoalState = [("safe".to_string(), Value::Bool(true))].into();
        let mut plan = planner.plan(&world, &goal).unwrap();
        assert_eq!(plan.update(&mut world), PlanStatus::Success);
    }
}
