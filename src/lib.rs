//! Echelon — hierarchical trading decision core.
//!
//! Three decision levels gate every entry:
//! - Macro: portfolio risk health (emergency stop, daily loss, streak, Sharpe)
//! - Strategic: directional bias from an indicator composite
//! - Tactical: execution timing from order-book imbalance
//!
//! Around the pipeline sit incremental indicators, a TTL signal cache, a risk
//! manager with dynamic position sizing, a concurrency-safe position store,
//! and a deterministic backtest replay engine sharing the same components via
//! an injectable clock.

pub mod agents;
pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod events;
pub mod exchange;
pub mod indicators;
pub mod replay;
pub mod risk;
pub mod store;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across symbol pipelines is
    /// Send + Sync. A type losing this breaks the build here instead of at a
    /// distant spawn site.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();
        require_send::<domain::MarketSnapshot>();
        require_sync::<domain::MarketSnapshot>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::ClosedTrade>();
        require_sync::<domain::ClosedTrade>();

        // Shared components
        require_send::<cache::SignalCache>();
        require_sync::<cache::SignalCache>();
        require_send::<risk::RiskManager>();
        require_sync::<risk::RiskManager>();
        require_send::<store::PositionStore>();
        require_sync::<store::PositionStore>();
        require_send::<agents::HierarchicalOrchestrator>();
        require_sync::<agents::HierarchicalOrchestrator>();

        // Clocks and sinks travel inside Arcs
        require_send::<clock::SystemClock>();
        require_sync::<clock::SystemClock>();
        require_send::<clock::SimClock>();
        require_sync::<clock::SimClock>();
        require_send::<events::MemorySink>();
        require_sync::<events::MemorySink>();
    }

    /// Architecture contract: MacroFilterAgent reads the risk snapshot by
    /// shared reference and cannot mutate risk state. Only `RiskManager`'s
    /// own methods do.
    #[test]
    fn macro_policy_cannot_mutate_risk_state() {
        fn _check_trait_object_builds(
            policy: &dyn agents::MacroPolicy,
            risk: &risk::RiskSnapshot,
            now: chrono::DateTime<chrono::Utc>,
        ) -> domain::Signal {
            policy.evaluate(risk, now, chrono::Duration::seconds(60))
        }
    }
}
