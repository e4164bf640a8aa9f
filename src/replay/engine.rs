//! Backtest replay engine.
//!
//! Single-threaded by design: ticks drive a virtual clock, and the engine
//! runs the identical component chain the live path uses, so replay exercises
//! the real decision logic rather than a parallel implementation. Exit rules
//! are applied to the open position before any new entry is considered, in
//! fixed priority order: emergency stop, stop-loss, take-profit, trailing
//! stop, time-cut.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use tracing::{debug, warn};

use crate::agents::{
    HierarchicalOrchestrator, MacroFilterAgent, Outcome, StrategicAgent, TacticalAgent,
};
use crate::clock::{Clock, SimClock};
use crate::config::TradingConfig;
use crate::domain::{ClosedTrade, ExitReason, MarketSnapshot, Position, Side, TrailingState};
use crate::events::{EventSink, NullSink, TradingEvent};
use crate::indicators::{IndicatorEngine, IndicatorState};
use crate::replay::source::{ReplayError, TickRecord};
use crate::replay::stats::BacktestStats;
use crate::risk::{size_position, RiskManager, SizingInputs};
use crate::store::PositionStore;

/// Completed replay: ordered trade log, aggregate stats, and a digest that
/// two runs over the same stream must reproduce exactly.
#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub trades: Vec<ClosedTrade>,
    pub stats: BacktestStats,
    pub log_digest: String,
}

pub struct BacktestReplayEngine {
    config: TradingConfig,
    clock: Arc<SimClock>,
    risk: Arc<RiskManager>,
    store: PositionStore,
    indicators: IndicatorEngine,
    orchestrator: HierarchicalOrchestrator,
    sink: Arc<dyn EventSink>,
    last_snapshot: HashMap<String, MarketSnapshot>,
    last_timestamp: Option<DateTime<Utc>>,
    trades: Vec<ClosedTrade>,
}

impl BacktestReplayEngine {
    pub fn new(config: TradingConfig) -> Self {
        Self::with_sink(config, Arc::new(NullSink))
    }

    pub fn with_sink(config: TradingConfig, sink: Arc<dyn EventSink>) -> Self {
        let clock = SimClock::shared(DateTime::UNIX_EPOCH);
        let risk = Arc::new(RiskManager::new(config.risk, clock.clone(), sink.clone()));
        let store = PositionStore::new(config.risk, sink.clone());
        let indicators = IndicatorEngine::new(config.indicators);
        let orchestrator = HierarchicalOrchestrator::new(
            clock.clone(),
            risk.clone(),
            Arc::new(MacroFilterAgent::new(config.risk)),
            Arc::new(StrategicAgent::new(config.weights, &config.thresholds)),
            Arc::new(TacticalAgent::new(config.thresholds)),
            config.ttl,
        );
        Self {
            config,
            clock,
            risk,
            store,
            indicators,
            orchestrator,
            sink,
            last_snapshot: HashMap::new(),
            last_timestamp: None,
            trades: Vec::new(),
        }
    }

    /// Replay an ordered tick stream to completion. Any still-open position
    /// is closed at its last observed price when the stream ends.
    pub fn run(
        mut self,
        ticks: impl IntoIterator<Item = Result<TickRecord, ReplayError>>,
    ) -> Result<BacktestRun, ReplayError> {
        for tick in ticks {
            self.step(tick?)?;
        }
        self.flatten_remaining();

        let stats = BacktestStats::from_trades(&self.trades);
        let log_digest = super::report::log_digest(&self.trades);
        Ok(BacktestRun {
            trades: self.trades,
            stats,
            log_digest,
        })
    }

    fn step(&mut self, tick: TickRecord) -> Result<(), ReplayError> {
        if let Some(previous) = self.last_timestamp {
            if tick.timestamp < previous {
                return Err(ReplayError::OutOfOrder {
                    previous,
                    current: tick.timestamp,
                });
            }
        }
        self.last_timestamp = Some(tick.timestamp);
        self.clock.set(tick.timestamp);

        let snapshot = tick.into_snapshot();
        let state = self.indicators.update(&snapshot).clone();

        let closed = self.apply_exit_rules(&snapshot);

        // One action per symbol per tick: a close consumes the tick
        if !closed && !self.store.contains(&snapshot.symbol) {
            self.consider_entry(&snapshot, &state);
        }

        self.last_snapshot.insert(snapshot.symbol.clone(), snapshot);
        Ok(())
    }

    /// Evaluate exit rules for the symbol's open position. Returns true when
    /// a position was closed this tick.
    fn apply_exit_rules(&mut self, snapshot: &MarketSnapshot) -> bool {
        let Some(position) = self.store.get(&snapshot.symbol) else {
            return false;
        };
        let Some(price) = evaluation_price(snapshot, position.side) else {
            return false;
        };

        self.store.update_trailing(&snapshot.symbol, price);
        // Re-read so the trailing check sees the ratcheted watermark
        let Some(position) = self.store.get(&snapshot.symbol) else {
            return false;
        };

        let exits = &self.config.exits;
        let now = self.clock.now();
        let reason = if self.risk.snapshot().emergency_stop {
            Some(ExitReason::EmergencyStop)
        } else if stop_loss_hit(&position, price) {
            Some(ExitReason::StopLoss)
        } else if take_profit_hit(&position, price) {
            Some(ExitReason::TakeProfit)
        } else if exits.trailing_enabled && trailing_hit(&position, price, exits.trailing_stop_rate)
        {
            Some(ExitReason::TrailingStop)
        } else if position.holding_seconds(now) >= exits.time_cut_seconds as f64 {
            Some(ExitReason::TimeCut)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                self.close_position(&snapshot.symbol, price, reason);
                true
            }
            None => false,
        }
    }

    fn close_position(&mut self, symbol: &str, touch_price: f64, reason: ExitReason) {
        let Some(position) = self.store.close(symbol) else {
            return;
        };
        let slip = self.config.costs.slippage_bps / 10_000.0;
        // Exits cross the spread against the position
        let exit_fill = touch_price * (1.0 - position.side.sign() * slip);
        let exit_slippage = touch_price * slip * position.quantity;
        let entry_slippage = entry_slippage(&position, slip);
        let exit_fee = exit_fill * position.quantity * self.config.costs.taker_fee;

        let now = self.clock.now();
        let fees = position.entry_fee + exit_fee;
        let slippage = entry_slippage + exit_slippage;
        let net_pnl =
            position.side.sign() * (exit_fill - position.entry_price) * position.quantity - fees;
        let trade = ClosedTrade {
            symbol: position.symbol.clone(),
            side: position.side,
            entry_time: position.opened_at,
            exit_time: now,
            entry_price: position.entry_price,
            exit_price: exit_fill,
            quantity: position.quantity,
            size: position.size,
            gross_pnl: net_pnl + fees + slippage,
            fees,
            slippage,
            net_pnl,
            holding_seconds: position.holding_seconds(now),
            exit_reason: reason,
            signal_confidence: position.signal_confidence,
        };

        debug!(symbol, reason = reason.label(), net_pnl, "position closed");
        self.risk.record_trade_result(net_pnl);
        self.sink.publish(&TradingEvent::PositionClosed {
            symbol: symbol.to_string(),
            net_pnl,
            reason,
            at: now,
        });
        self.trades.push(trade);
    }

    fn consider_entry(&mut self, snapshot: &MarketSnapshot, state: &IndicatorState) {
        let risk_snapshot = self.risk.snapshot();
        if risk_snapshot.emergency_stop {
            return;
        }
        let decision = self.orchestrator.decide(snapshot, state);
        let Outcome::Approved {
            direction,
            confidence,
        } = decision.outcome
        else {
            return;
        };
        let Some(side) = Side::from_direction(direction) else {
            return;
        };

        let inputs = SizingInputs {
            volatility: state.volatility,
            confidence,
            sharpe: risk_snapshot.sharpe,
            consecutive_losses: risk_snapshot.consecutive_losses,
        };
        let size = match size_position(self.config.base_order_size, inputs, self.risk.limits()) {
            Ok(size) => size,
            Err(e) => {
                warn!(symbol = %snapshot.symbol, error = %e, "sizing refused entry");
                return;
            }
        };

        // Entries cross the spread in the trade direction
        let touch = match side {
            Side::Long => snapshot.best_ask().map(|l| l.price),
            Side::Short => snapshot.best_bid().map(|l| l.price),
        };
        let Some(touch) = touch else {
            return;
        };
        let slip = self.config.costs.slippage_bps / 10_000.0;
        let entry_fill = touch * (1.0 + side.sign() * slip);
        let quantity = size / entry_fill;
        let entry_fee = size * self.config.costs.taker_fee;

        let exits = &self.config.exits;
        let (take_profit, stop_loss) = match side {
            Side::Long => (
                entry_fill * (1.0 + exits.take_profit_rate),
                entry_fill * (1.0 - exits.stop_loss_rate),
            ),
            Side::Short => (
                entry_fill * (1.0 - exits.take_profit_rate),
                entry_fill * (1.0 + exits.stop_loss_rate),
            ),
        };
        let position = Position {
            symbol: snapshot.symbol.clone(),
            side,
            entry_price: entry_fill,
            size,
            quantity,
            entry_fee,
            opened_at: self.clock.now(),
            take_profit,
            stop_loss,
            trailing: exits
                .trailing_enabled
                .then(|| TrailingState::new(entry_fill)),
            signal_confidence: confidence,
        };
        if let Err(rejected) = self.store.try_open(position) {
            debug!(symbol = %snapshot.symbol, %rejected, "entry rejected by store");
        }
    }

    /// Close whatever is still open at end of stream, in symbol order so the
    /// trade log stays deterministic.
    fn flatten_remaining(&mut self) {
        let mut symbols = self.store.symbols();
        symbols.sort();
        for symbol in symbols {
            let Some(position) = self.store.get(&symbol) else {
                continue;
            };
            let price = self
                .last_snapshot
                .get(&symbol)
                .and_then(|snap| evaluation_price(snap, position.side))
                .unwrap_or(position.entry_price);
            self.close_position(&symbol, price, ExitReason::Manual);
        }
    }
}

/// Touch price an exit would execute against: bid for longs, ask for shorts.
fn evaluation_price(snapshot: &MarketSnapshot, side: Side) -> Option<f64> {
    match side {
        Side::Long => snapshot.best_bid().map(|l| l.price),
        Side::Short => snapshot.best_ask().map(|l| l.price),
    }
    .or(if snapshot.last_price > 0.0 {
        Some(snapshot.last_price)
    } else {
        None
    })
}

fn stop_loss_hit(position: &Position, price: f64) -> bool {
    match position.side {
        Side::Long => price <= position.stop_loss,
        Side::Short => price >= position.stop_loss,
    }
}

fn take_profit_hit(position: &Position, price: f64) -> bool {
    match position.side {
        Side::Long => price >= position.take_profit,
        Side::Short => price <= position.take_profit,
    }
}

fn trailing_hit(position: &Position, price: f64, rate: f64) -> bool {
    position
        .trailing
        .map(|trail| trail.retracement(price, position.side) >= rate)
        .unwrap_or(false)
}

/// Slippage paid at entry, reconstructed from the stored fill price.
fn entry_slippage(position: &Position, slip: f64) -> f64 {
    let divisor = 1.0 + position.side.sign() * slip;
    let touch = position.entry_price / divisor;
    (position.entry_price - touch).abs() * position.quantity
}
