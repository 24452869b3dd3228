use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;

use crate::action::{Action, ActionHandle};
use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::plan::{Plan, PlanStep};
use crate::state::{EffectExpr, GoalState, WorldState};

/// Node in the backward search. `remaining` is the set of (key, demanded
/// value) pairs still to be achieved; `path` is the steps chosen so far, in
/// goal-to-start order, as (action index, snapshot) pairs.
#[derive(Clone)]
struct SearchNode {
    remaining: GoalState,
    path: Vec<(usize, GoalState)>,
    g: f32,
    f: f32,
    seq: u64,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.seq == other.seq
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse on f so the lowest f pops first,
        // then reverse on seq so equal-f nodes pop in insertion order.
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Backward best-first planner over a registered action library.
///
/// Search runs from the goal toward the current world: each expansion picks
/// an action that produces a demanded value, drops what the action supplies
/// and adds what it requires, until the initial world satisfies everything
/// that remains.
pub struct Planner {
    actions: Vec<ActionHandle>,
    config: PlannerConfig,
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field(
                "actions",
                &self
                    .actions
                    .iter()
                    .map(|a| a.borrow().name().to_string())
                    .collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}

impl Planner {
    /// Register the action library, checking every declared precondition,
    /// effect, and reference target against the keys the initial world
    /// declares.
    pub fn new(actions: Vec<ActionHandle>, world: &WorldState) -> Result<Self, PlanError> {
        Self::with_config(actions, world, PlannerConfig::default())
    }

    pub fn with_config(
        actions: Vec<ActionHandle>,
        world: &WorldState,
        config: PlannerConfig,
    ) -> Result<Self, PlanError> {
        for handle in &actions {
            let action = handle.borrow();
            for (key, expr) in action.preconditions() {
                if !world.contains_key(key) {
                    return Err(undeclared(&*action, key));
                }
                if let crate::state::PrecondExpr::Ref(target) = expr {
                    if !world.contains_key(target) {
                        return Err(undeclared(&*action, target));
                    }
                }
            }
            for key in action.effects().keys() {
                if !world.contains_key(key) {
                    return Err(undeclared(&*action, key));
                }
            }
        }
        Ok(Self { actions, config })
    }

    pub fn actions(&self) -> &[ActionHandle] {
        &self.actions
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Find an ordered action sequence that drives `world` into a state
    /// satisfying `goal`.
    pub fn plan(&self, world: &WorldState, goal: &GoalState) -> Result<Plan, PlanError> {
        let mut frontier = BinaryHeap::new();
        let mut visited: HashMap<GoalState, f32> = HashMap::new();
        let mut seq: u64 = 0;

        let h0 = unsatisfied_count(world, goal) as f32;
        frontier.push(SearchNode {
            remaining: goal.clone(),
            path: Vec::new(),
            g: 0.0,
            f: h0,
            seq,
        });

        let mut explored = 0usize;

        while let Some(node) = frontier.pop() {
            explored += 1;
            if explored > self.config.max_iterations {
                tracing::warn!(
                    iterations = self.config.max_iterations,
                    "planning gave up: search budget exhausted"
                );
                return Err(PlanError::SearchBudget {
                    iterations: self.config.max_iterations,
                });
            }

            if unsatisfied_count(world, &node.remaining) == 0 {
                tracing::debug!(
                    steps = node.path.len(),
                    cost = node.g,
                    explored,
                    "plan found"
                );
                return Ok(self.assemble(node));
            }

            match visited.get(&node.remaining) {
                Some(&g) if g <= node.g => continue,
                _ => {
                    visited.insert(node.remaining.clone(), node.g);
                }
            }

            if node.path.len() >= self.config.max_plan_length {
                continue;
            }

            for (idx, handle) in self.actions.iter().enumerate() {
                let action = handle.borrow();

                // Candidate iff some demanded pair is producible by this
                // action: a concrete effect equal to the demand, or `Any`,
                // which binds to it. Satisfied demands count too: an
                // earlier action may clobber them, so they must stay
                // regressable.
                let produces = node.remaining.iter().any(|(key, demanded)| {
                    match action.effects().get(key) {
                        Some(EffectExpr::Value(v)) => v == demanded,
                        Some(EffectExpr::Any) => true,
                        None => false,
                    }
                });
                if !produces {
                    continue;
                }

                // The snapshot is the goal state at selection time; `Any`
                // bindings are exactly the demanded pairs it carries.
                let snapshot = node.remaining.clone();

                if !action.check_procedural_precondition(world, &snapshot, true) {
                    continue;
                }

                let Some(child) = regress(&*action, &snapshot) else {
                    continue;
                };

                let g = node.g + action.cost();
                let h = unsatisfied_count(world, &child) as f32;
                let mut path = node.path.clone();
                path.push((idx, snapshot));

                seq += 1;
                frontier.push(SearchNode {
                    remaining: child,
                    path,
                    g,
                    f: g + h,
                    seq,
                });
            }
        }

        tracing::debug!(explored, "no plan: frontier exhausted");
        Err(PlanError::NoPlan { explored })
    }

    fn assemble(&self, node: SearchNode) -> Plan {
        let steps = node
            .path
            .into_iter()
            .rev()
            .map(|(idx, snapshot)| PlanStep::new(Rc::clone(&self.actions[idx]), snapshot))
            .collect();
        Plan::new(steps)
    }
}

fn undeclared(action: &dyn Action, key: &str) -> PlanError {
    PlanError::UndeclaredKey {
        action: action.name().to_string(),
        key: key.to_string(),
    }
}

/// Demanded pairs the world does not already satisfy. Admissible heuristic:
/// each such pair needs at least one producing action.
fn unsatisfied_count(world: &WorldState, goal: &GoalState) -> usize {
    goal.iter()
        .filter(|(key, demanded)| world.get(key) != Some(*demanded))
        .count()
}

/// Regress a node's demands through `action`: drop what its effects supply,
/// add what its preconditions require (references resolved against the
/// snapshot). `None` when the action is inconsistent with the node: an
/// effect would clobber a differently-valued demand, a reference has no
/// binding to resolve against, or a precondition contradicts a demand the
/// action does not itself satisfy.
fn regress(action: &dyn Action, snapshot: &GoalState) -> Option<GoalState> {
    let mut child = snapshot.clone();

    for (key, effect) in action.effects() {
        match effect {
            EffectExpr::Value(v) => match child.get(key) {
                Some(demanded) if demanded == v => {
                    child.remove(key);
                }
                Some(_) => return None,
                None => {}
            },
            EffectExpr::Any => {
                child.remove(key);
            }
        }
    }

    for (key, expr) in action.preconditions() {
        let required = expr.resolve(snapshot)?.clone();
        match child.get(key) {
            Some(existing) if *existing != required => return None,
            _ => {
                child.insert(key.clone(), required);
            }
        }
    }

    Some(child)
}
