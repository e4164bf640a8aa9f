//! The hierarchical pipeline: Macro gate, Strategic bias, Tactical timing.
//!
//! Levels run strictly in order and short-circuit on the first non-pass. Each
//! level consults the signal cache before recomputing; macro entries are
//! additionally discarded whenever the risk state's generation counter moves,
//! so a fresh loss or an operator stop takes effect immediately instead of
//! riding out the 60s TTL.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{MacroPolicy, StrategicPolicy, TacticalInputs, TacticalPolicy};
use crate::cache::SignalCache;
use crate::clock::Clock;
use crate::config::TtlConfig;
use crate::domain::{Direction, Level, MarketSnapshot, Signal};
use crate::indicators::IndicatorState;
use crate::risk::RiskManager;

/// Pipeline stage, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Macro,
    Strategic,
    Tactical,
}

/// One level's contribution to the decision trace.
#[derive(Debug, Clone)]
pub struct StageTrace {
    pub stage: Stage,
    /// True when the signal came from the cache instead of a fresh evaluation.
    pub cached: bool,
    pub signal: Signal,
}

/// Terminal pipeline outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Approved { direction: Direction, confidence: f64 },
    Rejected { stage: Stage, reason: String },
}

/// Full result of one pipeline run.
#[derive(Debug, Clone)]
pub struct Decision {
    pub symbol: String,
    pub outcome: Outcome,
    pub trace: Vec<StageTrace>,
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        matches!(self.outcome, Outcome::Approved { .. })
    }
}

pub struct HierarchicalOrchestrator {
    clock: Arc<dyn Clock>,
    cache: SignalCache,
    risk: Arc<RiskManager>,
    macro_policy: Arc<dyn MacroPolicy>,
    strategic_policy: Arc<dyn StrategicPolicy>,
    tactical_policy: Arc<dyn TacticalPolicy>,
    ttl: TtlConfig,
    /// Risk generation behind the cached macro verdicts.
    macro_generation: Mutex<Option<u64>>,
}

impl HierarchicalOrchestrator {
    pub fn new(
        clock: Arc<dyn Clock>,
        risk: Arc<RiskManager>,
        macro_policy: Arc<dyn MacroPolicy>,
        strategic_policy: Arc<dyn StrategicPolicy>,
        tactical_policy: Arc<dyn TacticalPolicy>,
        ttl: TtlConfig,
    ) -> Self {
        Self {
            cache: SignalCache::new(clock.clone()),
            clock,
            risk,
            macro_policy,
            strategic_policy,
            tactical_policy,
            ttl,
            macro_generation: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &SignalCache {
        &self.cache
    }

    /// Run the full pipeline for one symbol against the latest snapshot and
    /// indicator state.
    pub fn decide(&self, snapshot: &MarketSnapshot, indicators: &IndicatorState) -> Decision {
        let symbol = snapshot.symbol.as_str();
        let now = self.clock.now();
        let mut trace = Vec::with_capacity(3);

        let risk_snapshot = self.risk.snapshot();
        self.refresh_macro_generation(risk_snapshot.generation);

        // Macro
        let (macro_signal, cached) = match self.cache.get(symbol, Level::Macro) {
            Some(signal) => (signal, true),
            None => {
                let signal =
                    self.macro_policy
                        .evaluate(&risk_snapshot, now, self.ttl.for_level(Level::Macro));
                self.cache.put(symbol, Level::Macro, signal.clone());
                (signal, false)
            }
        };
        let blocked = macro_signal.is_blocked();
        let macro_reason = macro_signal.reason.clone();
        trace.push(StageTrace {
            stage: Stage::Macro,
            cached,
            signal: macro_signal,
        });
        if blocked {
            info!(symbol, reason = %macro_reason, "macro blocked");
            return Decision {
                symbol: symbol.to_string(),
                outcome: Outcome::Rejected {
                    stage: Stage::Macro,
                    reason: macro_reason,
                },
                trace,
            };
        }

        // Strategic. Neutral results are not cached: "no bias yet" must be
        // rechecked on the next tick, while a directional call stays pinned
        // for its TTL to avoid flip-flopping.
        let (strategic_signal, cached) = match self.cache.get(symbol, Level::Strategic) {
            Some(signal) => (signal, true),
            None => {
                let signal = self.strategic_policy.evaluate(
                    indicators,
                    now,
                    self.ttl.for_level(Level::Strategic),
                );
                if signal.direction.is_directional() {
                    self.cache.put(symbol, Level::Strategic, signal.clone());
                }
                (signal, false)
            }
        };
        trace.push(StageTrace {
            stage: Stage::Strategic,
            cached,
            signal: strategic_signal.clone(),
        });
        if !strategic_signal.direction.is_directional() {
            debug!(symbol, reason = %strategic_signal.reason, "strategic neutral");
            return Decision {
                symbol: symbol.to_string(),
                outcome: Outcome::Rejected {
                    stage: Stage::Strategic,
                    reason: strategic_signal.reason,
                },
                trace,
            };
        }

        // Tactical. Same policy: only a confirmation is worth caching, a
        // missed timing window is re-evaluated against the next book.
        let (tactical_signal, cached) = match self.cache.get(symbol, Level::Tactical) {
            Some(signal) => (signal, true),
            None => {
                let inputs = TacticalInputs {
                    snapshot,
                    indicators,
                    strategic: &strategic_signal,
                };
                let signal = self.tactical_policy.evaluate(
                    &inputs,
                    now,
                    self.ttl.for_level(Level::Tactical),
                );
                if signal.direction.is_directional() {
                    self.cache.put(symbol, Level::Tactical, signal.clone());
                }
                (signal, false)
            }
        };
        trace.push(StageTrace {
            stage: Stage::Tactical,
            cached,
            signal: tactical_signal.clone(),
        });
        if !tactical_signal.direction.is_directional() {
            return Decision {
                symbol: symbol.to_string(),
                outcome: Outcome::Rejected {
                    stage: Stage::Tactical,
                    reason: tactical_signal.reason,
                },
                trace,
            };
        }
        if tactical_signal.direction != strategic_signal.direction {
            return Decision {
                symbol: symbol.to_string(),
                outcome: Outcome::Rejected {
                    stage: Stage::Tactical,
                    reason: "tactical direction disagrees with strategic".into(),
                },
                trace,
            };
        }

        info!(
            symbol,
            direction = ?tactical_signal.direction,
            confidence = tactical_signal.confidence,
            "pipeline approved"
        );
        Decision {
            symbol: symbol.to_string(),
            outcome: Outcome::Approved {
                direction: tactical_signal.direction,
                confidence: tactical_signal.confidence,
            },
            trace,
        }
    }

    /// Drop cached macro verdicts when the risk state has moved since they
    /// were computed.
    fn refresh_macro_generation(&self, generation: u64) {
        let mut seen = self.macro_generation.lock();
        if *seen != Some(generation) {
            self.cache.invalidate_level(Level::Macro);
            *seen = Some(generation);
        }
    }
}
