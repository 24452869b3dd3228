//! Skirmish demo: the director arbitrates between a target-gated kill goal
//! and a reload fallback while host systems (target scanner, weapon fire)
//! and an auxiliary state machine (movement) mutate the world between
//! ticks. The chase action commits its effect on entry, so the world records
//! `in_weapons_range` while the state machine is still closing in.

use std::collections::BTreeMap;

use anyhow::Result;
use stratagem_goap::{
    Action, ActionHandle, ActionStatus, Director, DirectorStatus, EffectExpr, FsmState, Goal,
    GoalState, PrecondExpr, Planner, StateMachine, StaticAction, StaticGoal, Value, WorldState,
};

fn int(world: &WorldState, key: &str) -> i64 {
    match world.get(key) {
        Some(Value::Int(i)) => *i,
        _ => 0,
    }
}

fn flag(world: &WorldState, key: &str) -> bool {
    world.get(key) == Some(&Value::Bool(true))
}

/// Movement driver: while a chase is requested, closes the distance to the
/// target a little each tick.
struct Approach;

impl FsmState for Approach {
    fn name(&self) -> &str {
        "approach"
    }

    fn update(&mut self, world: &mut WorldState) {
        if !flag(world, "chase_active") {
            return;
        }
        let distance = (int(world, "distance_to_target") - 3).max(0);
        world.set("distance_to_target", Value::Int(distance));
    }
}

/// Spawns one enemy at the start of the skirmish.
struct TargetScanner {
    spawned: bool,
}

impl TargetScanner {
    fn update(&mut self, world: &mut WorldState) {
        if self.spawned {
            return;
        }
        self.spawned = true;
        world.set("target", Value::Handle(7));
        world.set("target_alive", Value::Bool(true));
        world.set("target_health", Value::Int(30));
        world.set("distance_to_target", Value::Int(9));
        println!("[scanner] enemy #7 sighted, 9 units out");
    }
}

/// Applies weapon fire: damage, ammo drain, and the empty-magazine flags.
struct WeaponSystem;

impl WeaponSystem {
    fn update(&mut self, world: &mut WorldState) {
        if !flag(world, "fire_weapon") || !flag(world, "weapon_is_loaded") {
            return;
        }
        if !flag(world, "target_alive") {
            return;
        }

        let health = int(world, "target_health") - 10;
        world.set("target_health", Value::Int(health));

        let ammo = int(world, "ammo") - 1;
        world.set("ammo", Value::Int(ammo));
        if ammo <= 0 {
            world.set("has_ammo", Value::Bool(false));
            world.set("weapon_is_loaded", Value::Bool(false));
        }

        if health <= 0 {
            world.set("target_alive", Value::Bool(false));
            println!("[weapons] target down");
        }
    }
}

struct ChaseTarget {
    preconditions: BTreeMap<String, PrecondExpr>,
    effects: BTreeMap<String, EffectExpr>,
}

impl ChaseTarget {
    fn new() -> Self {
        Self {
            preconditions: BTreeMap::new(),
            effects: [("in_weapons_range".to_string(), EffectExpr::from(true))].into(),
        }
    }
}

impl Action for ChaseTarget {
    fn name(&self) -> &str {
        "chase_target"
    }
    fn preconditions(&self) -> &BTreeMap<String, PrecondExpr> {
        &self.preconditions
    }
    fn effects(&self) -> &BTreeMap<String, EffectExpr> {
        &self.effects
    }
    fn apply_effects_on_exit(&self) -> bool {
        false
    }
    fn check_procedural_precondition(
        &self,
        world: &WorldState,
        _goal_state: &GoalState,
        _is_planning: bool,
    ) -> bool {
        !matches!(world.get("target"), Some(Value::Nil) | None)
    }
    fn on_enter(&mut self, world: &mut WorldState, _goal_state: &GoalState) {
        println!("[chase] closing in");
        world.set("chase_active", Value::Bool(true));
    }
    fn get_status(&mut self, world: &mut WorldState, _goal_state: &GoalState) -> ActionStatus {
        if int(world, "distance_to_target") > int(world, "min_weapons_range") {
            return ActionStatus::Running;
        }
        world.set("chase_active", Value::Bool(false));
        ActionStatus::Success
    }
}

struct Attack {
    preconditions: BTreeMap<String, PrecondExpr>,
    effects: BTreeMap<String, EffectExpr>,
}

impl Attack {
    fn new() -> Self {
        Self {
            preconditions: [
                ("weapon_is_loaded".to_string(), PrecondExpr::from(true)),
                ("in_weapons_range".to_string(), PrecondExpr::from(true)),
            ]
            .into(),
            effects: [("target_is_dead".to_string(), EffectExpr::from(true))].into(),
        }
    }
}

impl Action for Attack {
    fn name(&self) -> &str {
        "attack"
    }
    fn preconditions(&self) -> &BTreeMap<String, PrecondExpr> {
        &self.preconditions
    }
    fn effects(&self) -> &BTreeMap<String, EffectExpr> {
        &self.effects
    }
    fn apply_effects_on_exit(&self) -> bool {
        false
    }
    fn on_enter(&mut self, world: &mut WorldState, _goal_state: &GoalState) {
        println!("[attack] opening fire");
        world.set("fire_weapon", Value::Bool(true));
    }
    fn get_status(&mut self, world: &mut WorldState, _goal_state: &GoalState) -> ActionStatus {
        if !flag(world, "weapon_is_loaded") {
            return ActionStatus::Failure;
        }
        match world.get("target") {
            Some(Value::Nil) | None => ActionStatus::Failure,
            Some(_) if !flag(world, "target_alive") => ActionStatus::Success,
            Some(_) => ActionStatus::Running,
        }
    }
    fn on_exit(&mut self, world: &mut WorldState, _goal_state: &GoalState) {
        world.set("fire_weapon", Value::Bool(false));
        world.set("target", Value::Nil);
    }
}

/// Restocks the magazine pool when the world runs dry.
struct FetchAmmo {
    preconditions: BTreeMap<String, PrecondExpr>,
    effects: BTreeMap<String, EffectExpr>,
}

impl FetchAmmo {
    fn new() -> Self {
        Self {
            preconditions: BTreeMap::new(),
            effects: [("has_ammo".to_string(), EffectExpr::from(true))].into(),
        }
    }
}

impl Action for FetchAmmo {
    fn name(&self) -> &str {
        "fetch_ammo"
    }
    fn preconditions(&self) -> &BTreeMap<String, PrecondExpr> {
        &self.preconditions
    }
    fn effects(&self) -> &BTreeMap<String, EffectExpr> {
        &self.effects
    }
    fn on_enter(&mut self, _world: &mut WorldState, _goal_state: &GoalState) {
        println!("[supply] grabbing an ammo pickup");
    }
    fn on_exit(&mut self, world: &mut WorldState, _goal_state: &GoalState) {
        world.set("ammo", Value::Int(12));
    }
}

struct KillEnemyGoal {
    state: GoalState,
}

impl KillEnemyGoal {
    fn new() -> Self {
        Self {
            state: [("target_is_dead".to_string(), Value::Bool(true))].into(),
        }
    }
}

impl Goal for KillEnemyGoal {
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

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let mut world = WorldState::new()
        .with("target", Value::Nil)
        .with("target_alive", false)
        .with("target_health", 0i64)
        .with("target_is_dead", false)
        .with("distance_to_target", -1i64)
        .with("min_weapons_range", 2i64)
        .with("in_weapons_range", false)
        .with("chase_active", false)
        .with("fire_weapon", false)
        .with("weapon_is_loaded", false)
        .with("has_ammo", true)
        .with("ammo", 6i64);

    let actions: Vec<ActionHandle> = vec![
        ChaseTarget::new().into_handle(),
        Attack::new().into_handle(),
        StaticAction::new("reload_weapon")
            .with_precondition("has_ammo", true)
            .with_effect("weapon_is_loaded", true)
            .into_handle(),
        FetchAmmo::new().into_handle(),
    ];

    let planner = Planner::new(actions, &world)?;
    let goals: Vec<Box<dyn Goal>> = vec![
        Box::new(KillEnemyGoal::new()),
        Box::new(
            StaticGoal::new("reload_weapon")
                .with_condition("weapon_is_loaded", true)
                .with_priority(0.45),
        ),
    ];
    let mut director = Director::new(planner, goals);

    let mut scanner = TargetScanner { spawned: false };
    let mut weapons = WeaponSystem;
    let mut fsm = StateMachine::new();
    fsm.add_state(Box::new(Approach));

    println!("Initial state: {world}");

    for tick in 0..60 {
        scanner.update(&mut world);
        weapons.update(&mut world);
        let status = director.update(&mut world);
        fsm.update(&mut world);

        if status == DirectorStatus::Succeeded && flag(&world, "target_is_dead") {
            println!("[tick {tick}] objective complete");
            break;
        }
    }

    println!("Final state: {world}");
    Ok(())
}
