//! Market snapshot — one immutable observation of the order book plus last trade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price level of the book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

impl BookLevel {
    pub fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }

    /// Quote-denominated value resting at this level.
    pub fn value(&self) -> f64 {
        self.price * self.size
    }
}

/// Immutable view of one symbol's market at one instant.
///
/// Bids are ordered best (highest) first, asks best (lowest) first. Produced
/// by an exchange adapter or the replay tick source; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    /// Last traded price.
    pub last_price: f64,
    /// Last traded size (base units).
    pub last_size: f64,
}

impl MarketSnapshot {
    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids.first().copied()
    }

    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks.first().copied()
    }

    /// Midpoint of the best quotes. `None` when either side is empty.
    pub fn mid_price(&self) -> Option<f64> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some((bid.price + ask.price) / 2.0)
    }

    /// Spread as a fraction of the mid price.
    pub fn spread_fraction(&self) -> Option<f64> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        let mid = (bid.price + ask.price) / 2.0;
        if mid <= 0.0 {
            return None;
        }
        Some((ask.price - bid.price) / mid)
    }

    /// Total bid size across the top `depth` levels.
    pub fn bid_depth(&self, depth: usize) -> f64 {
        self.bids.iter().take(depth).map(|l| l.size).sum()
    }

    /// Total ask size across the top `depth` levels.
    pub fn ask_depth(&self, depth: usize) -> f64 {
        self.asks.iter().take(depth).map(|l| l.size).sum()
    }

    /// Quote-denominated bid value across the top `depth` levels.
    pub fn bid_value(&self, depth: usize) -> f64 {
        self.bids.iter().take(depth).map(|l| l.value()).sum()
    }

    /// Quote-denominated ask value across the top `depth` levels.
    pub fn ask_value(&self, depth: usize) -> f64 {
        self.asks.iter().take(depth).map(|l| l.value()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            symbol: "BTC/USDT".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            bids: vec![BookLevel::new(99.0, 2.0), BookLevel::new(98.0, 3.0)],
            asks: vec![BookLevel::new(101.0, 1.0), BookLevel::new(102.0, 4.0)],
            last_price: 100.0,
            last_size: 0.5,
        }
    }

    #[test]
    fn best_quotes_and_mid() {
        let snap = snapshot();
        assert_eq!(snap.best_bid().unwrap().price, 99.0);
        assert_eq!(snap.best_ask().unwrap().price, 101.0);
        assert_eq!(snap.mid_price(), Some(100.0));
    }

    #[test]
    fn spread_fraction() {
        let snap = snapshot();
        // (101 - 99) / 100 = 2%
        assert!((snap.spread_fraction().unwrap() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn empty_book_has_no_mid() {
        let mut snap = snapshot();
        snap.asks.clear();
        assert_eq!(snap.mid_price(), None);
        assert_eq!(snap.spread_fraction(), None);
    }

    #[test]
    fn depth_sums_respect_limit() {
        let snap = snapshot();
        assert_eq!(snap.bid_depth(1), 2.0);
        assert_eq!(snap.bid_depth(10), 5.0);
        assert_eq!(snap.ask_value(2), 101.0 + 408.0);
    }

    #[test]
    fn snapshot_serialization_roundtrip() {
        let snap = snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let deser: MarketSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, deser);
    }
}
