//! Woodcutting demo: a single symbolic `go_to` action covers every trip
//! because its destination binds during planning. Prints the plan, then
//! drives it tick by tick.

use std::collections::BTreeMap;

use anyhow::Result;
use stratagem_goap::{
    Action, ActionHandle, ActionStatus, Director, EffectExpr, Goal, GoalState, PlanRenderer,
    PlanStatus, Planner, PrecondExpr, RenderFormat, StaticGoal, Value, WorldState,
};

struct GoTo {
    preconditions: BTreeMap<String, PrecondExpr>,
    effects: BTreeMap<String, EffectExpr>,
}

impl GoTo {
    fn new() -> Self {
        Self {
            preconditions: BTreeMap::new(),
            effects: [("at_location".to_string(), EffectExpr::Any)].into(),
        }
    }
}

impl Action for GoTo {
    fn name(&self) -> &str {
        "go_to"
    }
    fn preconditions(&self) -> &BTreeMap<String, PrecondExpr> {
        &self.preconditions
    }
    fn effects(&self) -> &BTreeMap<String, EffectExpr> {
        &self.effects
    }
    fn on_enter(&mut self, _world: &mut WorldState, goal_state: &GoalState) {
        if let Some(destination) = goal_state.get("at_location") {
            println!("Going to find the {destination}");
        }
    }
}

struct GetAxe {
    preconditions: BTreeMap<String, PrecondExpr>,
    effects: BTreeMap<String, EffectExpr>,
}

impl GetAxe {
    fn new() -> Self {
        Self {
            preconditions: [("at_location".to_string(), PrecondExpr::from("axe"))].into(),
            effects: [("has_axe".to_string(), EffectExpr::from(true))].into(),
        }
    }
}

impl Action for GetAxe {
    fn name(&self) -> &str {
        "get_axe"
    }
    fn preconditions(&self) -> &BTreeMap<String, PrecondExpr> {
        &self.preconditions
    }
    fn effects(&self) -> &BTreeMap<String, EffectExpr> {
        &self.effects
    }
    fn on_enter(&mut self, _world: &mut WorldState, _goal_state: &GoalState) {
        println!("Collecting ye olde axe!");
    }
}

struct CutTrees {
    preconditions: BTreeMap<String, PrecondExpr>,
    effects: BTreeMap<String, EffectExpr>,
    ticks_left: u32,
}

impl CutTrees {
    fn new() -> Self {
        Self {
            preconditions: [
                ("at_location".to_string(), PrecondExpr::from("forest")),
                ("has_axe".to_string(), PrecondExpr::from(true)),
            ]
            .into(),
            effects: [("has_wood".to_string(), EffectExpr::from(true))].into(),
            ticks_left: 0,
        }
    }
}

impl Action for CutTrees {
    fn name(&self) -> &str {
        "cut_trees"
    }
    fn preconditions(&self) -> &BTreeMap<String, PrecondExpr> {
        &self.preconditions
    }
    fn effects(&self) -> &BTreeMap<String, EffectExpr> {
        &self.effects
    }
    fn on_enter(&mut self, _world: &mut WorldState, _goal_state: &GoalState) {
        println!("Cutting trees for days!");
        self.ticks_left = 3;
    }
    fn get_status(&mut self, _world: &mut WorldState, _goal_state: &GoalState) -> ActionStatus {
        if self.ticks_left > 0 {
            self.ticks_left -= 1;
            ActionStatus::Running
        } else {
            ActionStatus::Success
        }
    }
    fn on_exit(&mut self, _world: &mut WorldState, _goal_state: &GoalState) {
        println!("I has wood!");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let mut world = WorldState::new()
        .with("at_location", Value::Nil)
        .with("has_axe", false)
        .with("has_wood", false);

    let actions: Vec<ActionHandle> = vec![
        GoTo::new().into_handle(),
        GetAxe::new().into_handle(),
        CutTrees::new().into_handle(),
    ];

    let planner = Planner::new(actions, &world)?;
    let goals: Vec<Box<dyn Goal>> =
        vec![Box::new(StaticGoal::new("stockpile_wood").with_condition("has_wood", true))];
    let director = Director::new(planner, goals);

    println!("Initial state: {world}");

    let mut plan = director.find_best_plan(&world)?;
    println!("{}", PlanRenderer::new(RenderFormat::Text).render(&plan));
    println!("---- Running plan {}", "-".repeat(34));

    while plan.update(&mut world) == PlanStatus::Running {}

    println!("{}", "-".repeat(50));
    println!("Final state: {world}");
    Ok(())
}
