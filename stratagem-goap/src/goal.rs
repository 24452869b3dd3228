use crate::state::{GoalState, Value, WorldState};

/// A candidate objective the director can pursue.
///
/// `relevance` is the goal's current desirability given the live world;
/// the default forwards the static `priority`. A non-positive relevance
/// means "not currently applicable" and removes the goal from arbitration.
pub trait Goal {
    fn name(&self) -> &str;

    /// The desired partial world state. Values are concrete; a goal never
    /// demands a symbolic or unbound value.
    fn state(&self) -> &GoalState;

    fn priority(&self) -> f32 {
        1.0
    }

    fn relevance(&self, _world: &WorldState) -> f32 {
        self.priority()
    }
}

/// Fixed-state, fixed-priority goal.
#[derive(Debug, Clone)]
pub struct StaticGoal {
    name: String,
    state: GoalState,
    priority: f32,
}

impl StaticGoal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: GoalState::new(),
            priority: 1.0,
        }
    }

    pub fn with_condition(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.insert(key.into(), value.into());
        self
    }

    pub fn with_priority(mut self, priority: f32) -> Self {
        self.priority = priority;
        self
    }
}

impl Goal for StaticGoal {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &GoalState {
        &self.state
    }

    fn priority(&self) -> f32 {
        self.priority
    }
}
