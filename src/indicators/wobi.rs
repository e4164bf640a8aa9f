//! Weighted Order-Book Imbalance and its rolling z-score.
//!
//! W-OBI = (bid value - ask value) / (bid value + ask value) over the top-N
//! book levels, weighted by notional value. A rolling window of recent W-OBI
//! readings (including the current one) supplies the mean and population
//! standard deviation for the z-score.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::domain::MarketSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WobiReading {
    pub wobi: f64,
    /// Standard score of `wobi` against the rolling window; 0 when the
    /// window has no dispersion or holds a single sample.
    pub zscore: f64,
}

/// Rolling W-OBI tracker for one symbol.
#[derive(Debug, Clone)]
pub struct WobiTracker {
    window_len: usize,
    depth: usize,
    window: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
}

impl WobiTracker {
    pub fn new(window_len: usize, depth: usize) -> Self {
        assert!(window_len >= 1, "W-OBI window must be >= 1");
        assert!(depth >= 1, "W-OBI depth must be >= 1");
        Self {
            window_len,
            depth,
            window: VecDeque::with_capacity(window_len + 1),
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Feed one snapshot. Returns `None` when the book is empty on both sides.
    pub fn update(&mut self, snapshot: &MarketSnapshot) -> Option<WobiReading> {
        let bid_value = snapshot.bid_value(self.depth);
        let ask_value = snapshot.ask_value(self.depth);
        let total = bid_value + ask_value;
        if total <= 0.0 {
            return None;
        }
        let wobi = (bid_value - ask_value) / total;

        self.window.push_back(wobi);
        self.sum += wobi;
        self.sum_sq += wobi * wobi;
        if self.window.len() > self.window_len {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
                self.sum_sq -= old * old;
            }
        }

        let n = self.window.len() as f64;
        let mean = self.sum / n;
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        let std = variance.sqrt();
        let zscore = if std > 0.0 { (wobi - mean) / std } else { 0.0 };

        Some(WobiReading { wobi, zscore })
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }
}
