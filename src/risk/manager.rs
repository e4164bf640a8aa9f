//! Portfolio-level risk accounting.
//!
//! Tracks realized daily PnL, drawdown from the intraday peak, the losing
//! streak, and a trade-level Sharpe ratio. Crossing the daily loss limit trips
//! the emergency stop automatically; operators can also trip or clear it by
//! hand. Every state change bumps a generation counter so cached macro
//! verdicts can be discarded eagerly instead of waiting out their TTL.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::RiskLimits;
use crate::events::{EventSink, TradingEvent};

const ANNUALIZATION: f64 = 252.0;

#[derive(Debug, Default)]
struct RiskState {
    daily_pnl: f64,
    peak_pnl: f64,
    consecutive_losses: u32,
    trade_pnls: Vec<f64>,
    emergency_stop: bool,
    stop_reason: Option<String>,
    generation: u64,
}

/// Point-in-time view of the risk state.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskSnapshot {
    pub daily_pnl: f64,
    pub peak_pnl: f64,
    /// Distance below the intraday peak; non-negative.
    pub drawdown: f64,
    pub consecutive_losses: u32,
    pub trade_count: usize,
    /// Annualized trade-level Sharpe; `None` until two trades exist or while
    /// returns have no dispersion.
    pub sharpe: Option<f64>,
    pub emergency_stop: bool,
    pub stop_reason: Option<String>,
    pub generation: u64,
}

pub struct RiskManager {
    limits: RiskLimits,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    state: Mutex<RiskState>,
}

impl RiskManager {
    pub fn new(limits: RiskLimits, clock: Arc<dyn Clock>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            limits,
            clock,
            sink,
            state: Mutex::new(RiskState::default()),
        }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Record one closed trade's net PnL. Trips the emergency stop when the
    /// daily loss limit is breached.
    pub fn record_trade_result(&self, net_pnl: f64) {
        let mut state = self.state.lock();
        state.daily_pnl += net_pnl;
        state.peak_pnl = state.peak_pnl.max(state.daily_pnl);
        state.trade_pnls.push(net_pnl);
        if net_pnl < 0.0 {
            state.consecutive_losses += 1;
        } else {
            state.consecutive_losses = 0;
        }
        state.generation += 1;

        if !state.emergency_stop && state.daily_pnl <= -self.limits.daily_loss_limit {
            let reason = format!(
                "daily loss limit breached: pnl {:.2} <= -{:.2}",
                state.daily_pnl, self.limits.daily_loss_limit
            );
            warn!(daily_pnl = state.daily_pnl, "emergency stop tripped");
            state.emergency_stop = true;
            state.stop_reason = Some(reason.clone());
            self.sink.publish(&TradingEvent::EmergencyStop {
                reason,
                at: self.clock.now(),
            });
        }
    }

    /// Trip the emergency stop manually.
    pub fn force_stop(&self, reason: &str) {
        let mut state = self.state.lock();
        if state.emergency_stop {
            return;
        }
        state.emergency_stop = true;
        state.stop_reason = Some(reason.to_string());
        state.generation += 1;
        warn!(reason, "emergency stop forced");
        self.sink.publish(&TradingEvent::EmergencyStop {
            reason: reason.to_string(),
            at: self.clock.now(),
        });
    }

    /// Clear a tripped emergency stop.
    pub fn clear_stop(&self) {
        let mut state = self.state.lock();
        if !state.emergency_stop {
            return;
        }
        state.emergency_stop = false;
        state.stop_reason = None;
        state.generation += 1;
        info!("emergency stop cleared");
        self.sink
            .publish(&TradingEvent::EmergencyCleared { at: self.clock.now() });
    }

    /// Start a fresh trading day. Clears PnL, streak, and trade history but
    /// leaves a tripped emergency stop in place.
    pub fn reset_daily(&self) {
        let mut state = self.state.lock();
        state.daily_pnl = 0.0;
        state.peak_pnl = 0.0;
        state.consecutive_losses = 0;
        state.trade_pnls.clear();
        state.generation += 1;
        info!("daily risk state reset");
        self.sink
            .publish(&TradingEvent::DailyReset { at: self.clock.now() });
    }

    pub fn snapshot(&self) -> RiskSnapshot {
        let state = self.state.lock();
        RiskSnapshot {
            daily_pnl: state.daily_pnl,
            peak_pnl: state.peak_pnl,
            drawdown: (state.peak_pnl - state.daily_pnl).max(0.0),
            consecutive_losses: state.consecutive_losses,
            trade_count: state.trade_pnls.len(),
            sharpe: trade_sharpe(&state.trade_pnls),
            emergency_stop: state.emergency_stop,
            stop_reason: state.stop_reason.clone(),
            generation: state.generation,
        }
    }
}

/// Annualized Sharpe over per-trade PnLs (population std).
fn trade_sharpe(pnls: &[f64]) -> Option<f64> {
    if pnls.len() < 2 {
        return None;
    }
    let n = pnls.len() as f64;
    let mean = pnls.iter().sum::<f64>() / n;
    let variance = pnls.iter().map(|p| (p - mean) * (p - mean)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std == 0.0 {
        return None;
    }
    Some(mean / std * ANNUALIZATION.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimClock;
    use crate::events::{MemorySink, NullSink};
    use chrono::{TimeZone, Utc};

    fn manager_with_sink() -> (RiskManager, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let clock = SimClock::shared(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let limits = RiskLimits {
            daily_loss_limit: 100.0,
            ..RiskLimits::default()
        };
        (RiskManager::new(limits, clock, sink.clone()), sink)
    }

    #[test]
    fn tracks_pnl_peak_and_drawdown() {
        let (manager, _) = manager_with_sink();
        manager.record_trade_result(50.0);
        manager.record_trade_result(-20.0);

        let snap = manager.snapshot();
        assert_eq!(snap.daily_pnl, 30.0);
        assert_eq!(snap.peak_pnl, 50.0);
        assert_eq!(snap.drawdown, 20.0);
        assert_eq!(snap.trade_count, 2);
    }

    #[test]
    fn losing_streak_counts_and_resets_on_win() {
        let (manager, _) = manager_with_sink();
        manager.record_trade_result(-1.0);
        manager.record_trade_result(-1.0);
        assert_eq!(manager.snapshot().consecutive_losses, 2);
        manager.record_trade_result(2.0);
        assert_eq!(manager.snapshot().consecutive_losses, 0);
    }

    #[test]
    fn daily_loss_breach_trips_stop_and_publishes() {
        let (manager, sink) = manager_with_sink();
        manager.record_trade_result(-60.0);
        assert!(!manager.snapshot().emergency_stop);
        manager.record_trade_result(-40.0);

        let snap = manager.snapshot();
        assert!(snap.emergency_stop);
        assert!(snap.stop_reason.unwrap().contains("daily loss limit"));
        let events = sink.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, TradingEvent::EmergencyStop { .. })));
    }

    #[test]
    fn force_and_clear_stop() {
        let (manager, sink) = manager_with_sink();
        manager.force_stop("operator halt");
        assert!(manager.snapshot().emergency_stop);
        manager.clear_stop();
        assert!(!manager.snapshot().emergency_stop);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn generation_bumps_on_every_state_change() {
        let (manager, _) = manager_with_sink();
        let g0 = manager.snapshot().generation;
        manager.record_trade_result(1.0);
        let g1 = manager.snapshot().generation;
        manager.force_stop("halt");
        let g2 = manager.snapshot().generation;
        manager.clear_stop();
        manager.reset_daily();
        let g4 = manager.snapshot().generation;
        assert!(g0 < g1 && g1 < g2 && g2 < g4);
    }

    #[test]
    fn daily_reset_keeps_emergency_stop() {
        let (manager, _) = manager_with_sink();
        manager.force_stop("halt");
        manager.record_trade_result(-10.0);
        manager.reset_daily();

        let snap = manager.snapshot();
        assert_eq!(snap.daily_pnl, 0.0);
        assert_eq!(snap.trade_count, 0);
        assert!(snap.emergency_stop);
    }

    #[test]
    fn sharpe_needs_history_and_dispersion() {
        let clock = SimClock::shared(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let manager = RiskManager::new(RiskLimits::default(), clock, Arc::new(NullSink));
        assert_eq!(manager.snapshot().sharpe, None);
        manager.record_trade_result(10.0);
        assert_eq!(manager.snapshot().sharpe, None);
        manager.record_trade_result(10.0);
        // Two identical trades: zero dispersion
        assert_eq!(manager.snapshot().sharpe, None);
        manager.record_trade_result(20.0);
        assert!(manager.snapshot().sharpe.unwrap() > 0.0);
    }

    #[test]
    fn sharpe_reference_value() {
        // PnLs 10, -10: mean 0 -> sharpe 0; PnLs 10, 20: mean 15, std 5
        let clock = SimClock::shared(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let manager = RiskManager::new(RiskLimits::default(), clock, Arc::new(NullSink));
        manager.record_trade_result(10.0);
        manager.record_trade_result(20.0);
        let sharpe = manager.snapshot().sharpe.unwrap();
        let expected = 15.0 / 5.0 * 252.0f64.sqrt();
        assert!((sharpe - expected).abs() < 1e-9);
    }
}
