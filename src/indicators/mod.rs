//! Incremental technical indicators and the per-symbol indicator engine.
//!
//! Every indicator keeps O(1) state and is fed one price (or snapshot) at a
//! time; none of them recompute over full history. `IndicatorEngine` owns one
//! set of indicators per symbol and exposes a consolidated `IndicatorState`
//! snapshot after each market update.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod stochastic;
pub mod volatility;
pub mod wobi;

pub use bollinger::{Bollinger, BollingerReading};
pub use ema::Ema;
pub use macd::{Macd, MacdReading};
pub use rsi::WilderRsi;
pub use stochastic::{Stochastic, StochasticReading};
pub use volatility::ReturnsVolatility;
pub use wobi::{WobiReading, WobiTracker};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::IndicatorConfig;
use crate::domain::MarketSnapshot;

/// Latest readings for one symbol. Fields stay `None` until the underlying
/// indicator has warmed up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorState {
    pub samples: u64,
    pub rsi: Option<f64>,
    pub macd: Option<MacdReading>,
    pub bollinger: Option<BollingerReading>,
    pub stochastic: Option<StochasticReading>,
    pub volatility: Option<f64>,
    pub wobi: Option<WobiReading>,
}

impl IndicatorState {
    /// True once every composite-score input has warmed up.
    pub fn is_ready(&self) -> bool {
        self.rsi.is_some()
            && self.macd.is_some()
            && self.bollinger.is_some()
            && self.stochastic.is_some()
    }
}

/// Full indicator set for one symbol.
#[derive(Debug)]
struct SymbolIndicators {
    rsi: WilderRsi,
    macd: Macd,
    bollinger: Bollinger,
    stochastic: Stochastic,
    volatility: ReturnsVolatility,
    wobi: WobiTracker,
    state: IndicatorState,
}

impl SymbolIndicators {
    fn new(config: &IndicatorConfig) -> Self {
        Self {
            rsi: WilderRsi::new(config.rsi_period),
            macd: Macd::new(config.ema_fast, config.ema_slow, config.macd_signal),
            bollinger: Bollinger::new(config.bollinger_period, config.bollinger_std_dev),
            stochastic: Stochastic::new(config.stochastic_k, config.stochastic_d),
            volatility: ReturnsVolatility::new(config.volatility_window),
            wobi: WobiTracker::new(config.wobi_window, config.wobi_depth),
            state: IndicatorState::default(),
        }
    }

    fn update(&mut self, snapshot: &MarketSnapshot) -> &IndicatorState {
        let price = snapshot.last_price;
        self.state.samples += 1;
        self.state.rsi = self.rsi.update(price);
        self.state.macd = self.macd.update(price);
        self.state.bollinger = self.bollinger.update(price);
        self.state.stochastic = self.stochastic.update(price);
        self.state.volatility = self.volatility.update(price);
        self.state.wobi = self.wobi.update(snapshot);
        &self.state
    }
}

/// Maintains indicators per symbol; one `update` per market snapshot.
#[derive(Debug)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
    symbols: HashMap<String, SymbolIndicators>,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self {
            config,
            symbols: HashMap::new(),
        }
    }

    /// Feed one snapshot and return the refreshed state for its symbol.
    pub fn update(&mut self, snapshot: &MarketSnapshot) -> &IndicatorState {
        let entry = self
            .symbols
            .entry(snapshot.symbol.clone())
            .or_insert_with(|| SymbolIndicators::new(&self.config));
        let state = entry.update(snapshot);
        trace!(
            symbol = %snapshot.symbol,
            samples = state.samples,
            ready = state.is_ready(),
            "indicators updated"
        );
        state
    }

    /// Latest state for a symbol, if any snapshot has been seen.
    pub fn get(&self, symbol: &str) -> Option<&IndicatorState> {
        self.symbols.get(symbol).map(|s| &s.state)
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
