//! Open positions and trailing-stop state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::Direction;

/// Side of an open position. Unlike `Direction` there is no neutral variant;
/// a flat symbol simply has no entry in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn from_direction(direction: Direction) -> Option<Self> {
        match direction {
            Direction::Long => Some(Side::Long),
            Direction::Short => Some(Side::Short),
            Direction::Neutral => None,
        }
    }

    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

/// Trailing-stop watermark.
///
/// The watermark only ever ratchets in the favorable direction: up for longs,
/// down for shorts. Retracement from the watermark triggers the exit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingState {
    pub watermark: f64,
}

impl TrailingState {
    pub fn new(entry_price: f64) -> Self {
        Self {
            watermark: entry_price,
        }
    }

    /// Update the watermark. Favorable moves stick; adverse moves are ignored.
    pub fn ratchet(&mut self, price: f64, side: Side) {
        match side {
            Side::Long => {
                if price > self.watermark {
                    self.watermark = price;
                }
            }
            Side::Short => {
                if price < self.watermark {
                    self.watermark = price;
                }
            }
        }
    }

    /// Fractional retracement from the watermark in the adverse direction.
    pub fn retracement(&self, price: f64, side: Side) -> f64 {
        if self.watermark <= 0.0 {
            return 0.0;
        }
        match side {
            Side::Long => (self.watermark - price) / self.watermark,
            Side::Short => (price - self.watermark) / self.watermark,
        }
    }
}

/// An open position. Created on orchestrator approval + risk sizing, destroyed
/// by whichever exit rule fires first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    /// Quote-denominated size committed at entry.
    pub size: f64,
    /// Base units held (`size / entry_price`).
    pub quantity: f64,
    pub entry_fee: f64,
    pub opened_at: DateTime<Utc>,
    /// Absolute take-profit price level.
    pub take_profit: f64,
    /// Absolute stop-loss price level.
    pub stop_loss: f64,
    pub trailing: Option<TrailingState>,
    /// Combined decision confidence at entry, kept for the trade record.
    pub signal_confidence: f64,
}

impl Position {
    /// Signed PnL at `price`, before fees.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) * self.quantity
    }

    /// Exposure this position contributes to the portfolio cap.
    pub fn exposure(&self) -> f64 {
        self.size
    }

    pub fn holding_seconds(&self, now: DateTime<Utc>) -> f64 {
        (now - self.opened_at).num_milliseconds() as f64 / 1000.0
    }
}
