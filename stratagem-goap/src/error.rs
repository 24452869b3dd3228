use thiserror::Error;

/// Planning failures. All are recoverable at the director level: the
/// director simply moves on to the next candidate goal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The search frontier emptied without reaching a state the initial
    /// world satisfies.
    #[error("no plan: frontier exhausted after exploring {explored} states")]
    NoPlan { explored: usize },

    /// The search gave up after the configured number of expansions.
    #[error("no plan: search budget of {iterations} iterations exhausted")]
    SearchBudget { iterations: usize },

    /// An action declaration references a key the initial world state does
    /// not declare. Raised once, at planner construction.
    #[error("action '{action}' references undeclared world key '{key}'")]
    UndeclaredKey { action: String, key: String },
}

/// Director-level outcome when no goal can currently be pursued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DirectorError {
    /// Every goal either scored a non-positive relevance or produced no
    /// plan. The director idles until the world changes.
    #[error("no goal is currently relevant and plannable")]
    NoApplicableGoal,
}

/// Why a running plan transitioned to failure. Recorded on the plan so the
/// host can inspect it before the director replans.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanFailure {
    /// A declared precondition of the current step no longer holds against
    /// the live world (it changed since planning).
    #[error("precondition '{key}' of action '{action}' no longer holds")]
    PreconditionInvalidated { action: String, key: String },

    /// The current step's procedural precondition rejected the live world.
    #[error("procedural precondition of action '{action}' no longer holds")]
    ProceduralInvalidated { action: String },

    /// The step's `get_status` reported failure.
    #[error("action '{action}' reported failure")]
    ActionFailed { action: String },
}
