//! The three decision levels and the orchestrator that chains them.
//!
//! Each level is a stateless evaluator over an explicit input: risk snapshot
//! for macro, indicator state for strategic, order book plus strategic signal
//! for tactical. The orchestrator owns the cache and composes the levels in
//! strict Macro -> Strategic -> Tactical order with short-circuit on the
//! first non-pass.

pub mod macro_filter;
pub mod orchestrator;
pub mod strategic;
pub mod tactical;

pub use macro_filter::MacroFilterAgent;
pub use orchestrator::{Decision, HierarchicalOrchestrator, Outcome, Stage, StageTrace};
pub use strategic::StrategicAgent;
pub use tactical::{TacticalAgent, TacticalInputs};

use chrono::{DateTime, Duration, Utc};

use crate::domain::Signal;
use crate::indicators::IndicatorState;
use crate::risk::RiskSnapshot;

/// Portfolio-level gate. Never proposes a direction.
pub trait MacroPolicy: Send + Sync {
    fn evaluate(&self, risk: &RiskSnapshot, now: DateTime<Utc>, ttl: Duration) -> Signal;
}

/// Directional bias from indicator state.
pub trait StrategicPolicy: Send + Sync {
    fn evaluate(&self, indicators: &IndicatorState, now: DateTime<Utc>, ttl: Duration) -> Signal;
}

/// Execution timing from order-book microstructure.
pub trait TacticalPolicy: Send + Sync {
    fn evaluate(&self, inputs: &TacticalInputs<'_>, now: DateTime<Utc>, ttl: Duration) -> Signal;
}
