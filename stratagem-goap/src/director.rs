use std::cmp::Ordering;

use crate::error::DirectorError;
use crate::goal::Goal;
use crate::plan::{Plan, PlanStatus};
use crate::planner::Planner;
use crate::state::WorldState;

/// What the director is doing this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorStatus {
    /// No goal is currently relevant and plannable.
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Owns the planner and the candidate goal set, picks the best achievable
/// goal, and drives one plan at a time.
///
/// Plans are replaced wholesale: when the current plan reaches a terminal
/// status the director drops it and replans on the next tick. A discarded
/// plan's steps get no `on_exit`; hosts that need teardown express it as a
/// failure-returning `get_status`.
pub struct Director {
    planner: Planner,
    goals: Vec<Box<dyn Goal>>,
    plan: Option<Plan>,
}

impl Director {
    pub fn new(planner: Planner, goals: Vec<Box<dyn Goal>>) -> Self {
        Self {
            planner,
            goals,
            plan: None,
        }
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn current_plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// Score every goal by relevance, drop the non-positive ones, and ask
    /// the planner for each in descending order; the first plannable goal
    /// wins. Ties keep registration order.
    pub fn find_best_plan(&self, world: &WorldState) -> Result<Plan, DirectorError> {
        let mut candidates: Vec<(f32, &dyn Goal)> = self
            .goals
            .iter()
            .map(|goal| (goal.relevance(world), goal.as_ref()))
            .filter(|(relevance, _)| *relevance > 0.0)
            .collect();
        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        for (relevance, goal) in candidates {
            match self.planner.plan(world, goal.state()) {
                Ok(mut plan) => {
                    tracing::debug!(
                        goal = goal.name(),
                        relevance,
                        steps = plan.steps().len(),
                        "goal selected"
                    );
                    plan.set_label(goal.name());
                    return Ok(plan);
                }
                Err(err) => {
                    tracing::debug!(goal = goal.name(), %err, "goal not plannable");
                }
            }
        }

        Err(DirectorError::NoApplicableGoal)
    }

    /// Per-tick entry point. Installs a fresh plan when there is none (or
    /// the current one finished), otherwise advances the current plan and
    /// propagates its status.
    pub fn update(&mut self, world: &mut WorldState) -> DirectorStatus {
        if let Some(plan) = self.plan.as_mut() {
            if plan.status() == PlanStatus::Running {
                return match plan.update(world) {
                    PlanStatus::Running => DirectorStatus::Running,
                    PlanStatus::Success => DirectorStatus::Succeeded,
                    PlanStatus::Failure => DirectorStatus::Failed,
                };
            }
        }

        match self.find_best_plan(world) {
            Ok(plan) => {
                self.plan = Some(plan);
                DirectorStatus::Running
            }
            Err(DirectorError::NoApplicableGoal) => {
                self.plan = None;
                DirectorStatus::Idle
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, StaticAction};
    use crate::goal::StaticGoal;
    use crate::state::{GoalState, Value};

    struct TargetGatedGoal {
        state: GoalState,
    }

    impl Goal for TargetGatedGoal {
        fn name(&self) -> &str {
            "kill_enemy"
        }
        fn state(&self) -> &GoalState {
            &self.state
        }
        fn relevance(&self, world: &WorldState) -> f32 {
            match world.get("target") {
                Some(Value::Nil) | None => 0.0,
                Some(_) => 0.7,
            }
        }
    }

    fn combat_world() -> WorldState {
        WorldState::new()
            .with("target", Value::Nil)
            .with("target_is_dead", false)
            .with("weapon_is_loaded", false)
            .with("has_ammo", true)
    }

    fn combat_director(world: &WorldState) -> Director {
        let actions = vec![
            StaticAction::new("reload")
                .with_precondition("has_ammo", true)
                .with_effect("weapon_is_loaded", true)
                .into_handle(),
            StaticAction::new("attack")
                .with_precondition("weapon_is_loaded", true)
                .with_effect("target_is_dead", true)
                .into_handle(),
        ];
        let planner = Planner::new(actions, world).unwrap();

        let goals: Vec<Box<dyn Goal>> = vec![
            Box::new(TargetGatedGoal {
                state: [("target_is_dead".to_string(), Value::Bool(true))].into(),
            }),
            Box::new(
                StaticGoal::new("reload_weapon")
                    .with_condition("weapon_is_loaded", true)
                    .with_priority(0.45),
            ),
        ];

        Director::new(planner, goals)
    }

    #[test]
    fn relevance_gates_goal_selection() {
        let world = combat_world();
        let director = combat_director(&world);

        // No target: kill_enemy scores 0 and drops out, reload wins.
        let plan = director.find_best_plan(&world).unwrap();
        assert_eq!(plan.label(), "reload_weapon");

        // With a target, the higher-relevance goal takes over.
        let mut armed = world.clone();
        armed.set("target", Value::Handle(3));
        let plan = director.find_best_plan(&armed).unwrap();
        assert_eq!(plan.label(), "kill_enemy");
    }

    #[test]
    fn idles_when_nothing_applies() {
        let mut world = combat_world();
        world.set("has_ammo", Value::Bool(false));
        world.set("weapon_is_loaded", Value::Bool(false));

        let mut director = combat_director(&world);
        // reload is relevant but unplannable without ammo; kill_enemy is
        // gated off. Nothing to do.
        assert_eq!(director.update(&mut world), DirectorStatus::Idle);
        assert!(director.current_plan().is_none());
    }

    #[test]
    fn drives_installed_plan_to_completion() {
        let mut world = combat_world();
        let mut director = combat_director(&mut world);

        assert_eq!(director.update(&mut world), DirectorStatus::Running);
        let mut ticks = 0;
        loop {
            let status = director.update(&mut world);
            ticks += 1;
            assert!(ticks < 20, "plan did not settle");
            if status == DirectorStatus::Succeeded {
                break;
            }
        }
        assert_eq!(world.get("weapon_is_loaded"), Some(&Value::Bool(true)));
    }

    #[test]
    fn replans_after_failure_next_tick() {
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
        let goals: Vec<Box<dyn Goal>> =
            vec![Box::new(StaticGoal::new("stockpile").with_condition("has_wood", true))];
        let mut director = Director::new(planner, goals);

        assert_eq!(director.update(&mut world), DirectorStatus::Running); // install
        director.update(&mut world); // get_axe enters
        director.update(&mut world); // get_axe succeeds, has_axe = true

        // Sabotage before cut_trees enters.
        world.set("has_axe", Value::Bool(false));
        assert_eq!(director.update(&mut world), DirectorStatus::Failed);

        // Next tick: a fresh plan that re-acquires the axe.
        assert_eq!(director.update(&mut world), DirectorStatus::Running);
        let names: Vec<String> = director
            .current_plan()
            .unwrap()
            .steps()
            .iter()
            .map(|s| s.action_name())
            .collect();
        assert_eq!(names, ["get_axe", "cut_trees"]);
    }
}
