//! Closed-trade records — the append-only output of the exit rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::position::Side;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    TrailingStop,
    TimeCut,
    EmergencyStop,
    Manual,
}

impl ExitReason {
    /// Stable short label used in trade logs and stats tables.
    pub fn label(&self) -> &'static str {
        match self {
            ExitReason::TakeProfit => "take_profit",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::TimeCut => "time_cut",
            ExitReason::EmergencyStop => "emergency_stop",
            ExitReason::Manual => "manual",
        }
    }
}

/// A completed round-trip trade. Appended to the trade log and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub side: Side,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Base units traded.
    pub quantity: f64,
    /// Quote-denominated size at entry.
    pub size: f64,
    pub gross_pnl: f64,
    /// Entry + exit fees.
    pub fees: f64,
    /// Total slippage paid across both legs, in quote units.
    pub slippage: f64,
    pub net_pnl: f64,
    pub holding_seconds: f64,
    pub exit_reason: ExitReason,
    /// Combined decision confidence at entry.
    pub signal_confidence: f64,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    /// Net return as a fraction of committed size.
    pub fn return_pct(&self) -> f64 {
        if self.size == 0.0 {
            return 0.0;
        }
        self.net_pnl / self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> ClosedTrade {
        let entry = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        ClosedTrade {
            symbol: "BTC/USDT".into(),
            side: Side::Long,
            entry_time: entry,
            exit_time: entry + chrono::Duration::seconds(42),
            entry_price: 100.0,
            exit_price: 100.2,
            quantity: 10.0,
            size: 1000.0,
            gross_pnl: 2.0,
            fees: 0.5,
            slippage: 0.15,
            net_pnl: 1.5,
            holding_seconds: 42.0,
            exit_reason: ExitReason::TakeProfit,
            signal_confidence: 0.8,
        }
    }

    #[test]
    fn winner_and_return() {
        let trade = sample();
        assert!(trade.is_winner());
        assert!((trade.return_pct() - 0.0015).abs() < 1e-12);
    }

    #[test]
    fn exit_reason_serializes_snake_case() {
        let json = serde_json::to_string(&ExitReason::TimeCut).unwrap();
        assert_eq!(json, "\"time_cut\"");
        assert_eq!(ExitReason::TimeCut.label(), "time_cut");
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: ClosedTrade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
