//! Trading configuration.
//!
//! One structured, immutable object passed into the core at construction
//! time. Deserializes from TOML; every section has defaults mirroring the
//! production parameter set, and `validate()` rejects inconsistent values
//! before any component is built.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Level;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("io error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-level signal TTLs, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TtlConfig {
    pub macro_secs: i64,
    pub strategic_secs: i64,
    pub tactical_secs: i64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            macro_secs: 60,
            strategic_secs: 30,
            tactical_secs: 10,
        }
    }
}

impl TtlConfig {
    pub fn for_level(&self, level: Level) -> Duration {
        let secs = match level {
            Level::Macro => self.macro_secs,
            Level::Strategic => self.strategic_secs,
            Level::Tactical => self.tactical_secs,
        };
        Duration::seconds(secs)
    }
}

/// Indicator periods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    /// Window of per-tick returns used for the volatility estimate.
    pub volatility_window: usize,
    /// Rolling window for W-OBI mean/stddev.
    pub wobi_window: usize,
    /// Book levels included in the W-OBI sum.
    pub wobi_depth: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast: 12,
            ema_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            stochastic_k: 14,
            stochastic_d: 3,
            volatility_window: 20,
            wobi_window: 100,
            wobi_depth: 10,
        }
    }
}

/// Strategic composite weights. They need not sum to one; the composite is
/// normalized by the weight sum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalWeights {
    pub rsi: f64,
    pub macd: f64,
    pub bollinger: f64,
    pub stochastic: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            rsi: 0.25,
            macd: 0.20,
            bollinger: 0.10,
            stochastic: 0.10,
        }
    }
}

impl SignalWeights {
    pub fn sum(&self) -> f64 {
        self.rsi + self.macd + self.bollinger + self.stochastic
    }
}

/// Agent decision thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Minimum strategic composite score ([0, 1]) for a directional call.
    pub signal_threshold: f64,
    /// |z| the W-OBI z-score must exceed for tactical approval.
    pub zscore_threshold: f64,
    /// Maximum spread as a fraction of mid price.
    pub max_spread_fraction: f64,
    /// Supporting-side depth must be at least this fraction of the opposing
    /// side for the book to favor the direction.
    pub depth_support_min: f64,
    /// Book levels included in the depth-ratio check.
    pub depth_check_levels: usize,
    /// Order-book data older than this is treated as stale.
    pub book_freshness_secs: i64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            signal_threshold: 0.6,
            zscore_threshold: 2.0,
            max_spread_fraction: 0.001,
            depth_support_min: 0.67,
            depth_check_levels: 5,
            book_freshness_secs: 5,
        }
    }
}

/// Exit rule parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExitConfig {
    /// Take-profit as a fraction of entry price.
    pub take_profit_rate: f64,
    /// Stop-loss as a fraction of entry price.
    pub stop_loss_rate: f64,
    /// Force-close after this many seconds.
    pub time_cut_seconds: i64,
    pub trailing_enabled: bool,
    /// Retracement from the watermark that triggers the trailing exit.
    pub trailing_stop_rate: f64,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            take_profit_rate: 0.0015,
            stop_loss_rate: 0.001,
            time_cut_seconds: 60,
            trailing_enabled: false,
            trailing_stop_rate: 0.0005,
        }
    }
}

/// Simulated execution costs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CostConfig {
    /// Slippage per leg in basis points of the touch price.
    pub slippage_bps: f64,
    /// Taker fee per leg as a fraction of notional.
    pub taker_fee: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            slippage_bps: 1.5,
            taker_fee: 0.0025,
        }
    }
}

/// Portfolio-wide risk limits and exposure caps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskLimits {
    /// Daily realized loss (positive number) that triggers the macro block
    /// and the automatic emergency stop.
    pub daily_loss_limit: f64,
    pub max_consecutive_losses: u32,
    /// Sharpe below this blocks entries, once enough trades exist.
    pub sharpe_floor: f64,
    /// Minimum closed trades before the Sharpe gate applies.
    pub min_trades_for_sharpe: usize,
    pub max_positions: usize,
    /// Per-symbol exposure cap, quote-denominated.
    pub max_position_size: f64,
    /// Portfolio-wide exposure cap, quote-denominated.
    pub max_total_exposure: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            daily_loss_limit: 100_000.0,
            max_consecutive_losses: 5,
            sharpe_floor: -0.5,
            min_trades_for_sharpe: 10,
            max_positions: 3,
            max_position_size: 1_000_000.0,
            max_total_exposure: 3_000_000.0,
        }
    }
}

/// Complete trading configuration, immutable per session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TradingConfig {
    pub symbols: Vec<String>,
    /// Baseline quote-denominated order size before risk scaling.
    pub base_order_size: f64,
    pub ttl: TtlConfig,
    pub indicators: IndicatorConfig,
    pub weights: SignalWeights,
    pub thresholds: ThresholdConfig,
    pub exits: ExitConfig,
    pub costs: CostConfig,
    pub risk: RiskLimits,
}

impl TradingConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: TradingConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.base_order_size <= 0.0 {
            return invalid(format!(
                "base_order_size must be positive, got {}",
                self.base_order_size
            ));
        }
        if self.ttl.macro_secs <= 0 || self.ttl.strategic_secs <= 0 || self.ttl.tactical_secs <= 0 {
            return invalid("all TTLs must be positive".into());
        }
        if self.indicators.ema_fast == 0 {
            return invalid("ema_fast must be at least 1".into());
        }
        if self.indicators.ema_fast >= self.indicators.ema_slow {
            return invalid(format!(
                "ema_fast ({}) must be shorter than ema_slow ({})",
                self.indicators.ema_fast, self.indicators.ema_slow
            ));
        }
        if self.indicators.macd_signal == 0 {
            return invalid("macd_signal must be at least 1".into());
        }
        if self.indicators.rsi_period == 0 {
            return invalid("rsi_period must be at least 1".into());
        }
        if self.indicators.bollinger_period < 2 {
            return invalid(format!(
                "bollinger_period must be at least 2, got {}",
                self.indicators.bollinger_period
            ));
        }
        if self.indicators.stochastic_k == 0 || self.indicators.stochastic_d == 0 {
            return invalid("stochastic periods must be at least 1".into());
        }
        if self.indicators.volatility_window < 2 {
            return invalid(format!(
                "volatility_window must be at least 2, got {}",
                self.indicators.volatility_window
            ));
        }
        if self.indicators.wobi_window == 0 || self.indicators.wobi_depth == 0 {
            return invalid("wobi_window and wobi_depth must be at least 1".into());
        }
        if self.weights.sum() <= 0.0 {
            return invalid("signal weights must sum to a positive value".into());
        }
        if !(0.0..=1.0).contains(&self.thresholds.signal_threshold) {
            return invalid(format!(
                "signal_threshold must be within [0, 1], got {}",
                self.thresholds.signal_threshold
            ));
        }
        if self.exits.take_profit_rate <= 0.0 || self.exits.stop_loss_rate <= 0.0 {
            return invalid("take_profit_rate and stop_loss_rate must be positive".into());
        }
        if self.exits.time_cut_seconds <= 0 {
            return invalid("time_cut_seconds must be positive".into());
        }
        if self.risk.max_position_size <= 0.0 || self.risk.max_total_exposure <= 0.0 {
            return invalid("exposure caps must be positive".into());
        }
        if self.risk.max_positions == 0 {
            return invalid("max_positions must be at least 1".into());
        }
        Ok(())
    }

    /// A small, fast configuration useful in tests and examples: short
    /// indicator periods so pipelines warm up within a few dozen ticks.
    pub fn compact() -> Self {
        Self {
            symbols: vec!["BTC/USDT".into()],
            base_order_size: 1_000.0,
            indicators: IndicatorConfig {
                ema_fast: 3,
                ema_slow: 6,
                macd_signal: 3,
                rsi_period: 5,
                bollinger_period: 8,
                stochastic_k: 5,
                stochastic_d: 3,
                volatility_window: 8,
                wobi_window: 10,
                ..IndicatorConfig::default()
            },
            ..Self::default()
        }
    }
}
