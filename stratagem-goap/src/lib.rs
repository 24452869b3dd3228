//! Goal-oriented action planning for interactive agents.
//!
//! Three cooperating parts: a backward best-first [`Planner`] that resolves
//! symbolic effect/precondition placeholders while it searches, a [`Plan`]
//! executor that drives each step through its lifecycle against the live
//! [`WorldState`], and a [`Director`] that arbitrates between candidate
//! goals by relevance and owns the current plan.
//!
//! Everything runs on the host's tick thread; the core never spawns tasks,
//! never blocks, and performs no I/O beyond optional config loading.

pub mod action;
pub mod config;
pub mod director;
pub mod error;
pub mod fsm;
pub mod goal;
pub mod plan;
pub mod planner;
pub mod render;
pub mod state;

pub use action::{Action, ActionHandle, ActionStatus, StaticAction};
pub use config::{ConfigError, PlannerConfig};
pub use director::{Director, DirectorStatus};
pub use error::{DirectorError, PlanError, PlanFailure};
pub use fsm::{FsmState, StateMachine};
pub use goal::{Goal, StaticGoal};
pub use plan::{Plan, PlanStatus, PlanStep};
pub use planner::Planner;
pub use render::{PlanRenderer, RenderFormat};
pub use state::{EffectExpr, GoalState, PrecondExpr, Value, WorldState};
