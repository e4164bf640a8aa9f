//! Bollinger Bands over a rolling window.
//!
//! Mean and sample standard deviation are maintained incrementally from
//! rolling sums, so each update is O(1). `position` locates the latest price
//! within the bands: -1 at the lower band, 0 at the mean, +1 at the upper.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerReading {
    pub mean: f64,
    pub std_dev: f64,
    pub upper: f64,
    pub lower: f64,
    /// Price location within the bands, clamped to [-1, 1].
    pub position: f64,
}

/// Incremental Bollinger(period, num_std).
#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    num_std: f64,
    window: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
}

impl Bollinger {
    pub fn new(period: usize, num_std: f64) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        Self {
            period,
            num_std,
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    pub fn update(&mut self, price: f64) -> Option<BollingerReading> {
        self.window.push_back(price);
        self.sum += price;
        self.sum_sq += price * price;
        if self.window.len() > self.period {
            // Window is never empty here
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
                self.sum_sq -= old * old;
            }
        }
        if self.window.len() < self.period {
            return None;
        }

        let n = self.period as f64;
        let mean = self.sum / n;
        // Sample variance; floating-point cancellation can dip just below zero
        let variance = ((self.sum_sq - self.sum * self.sum / n) / (n - 1.0)).max(0.0);
        let std_dev = variance.sqrt();
        let upper = mean + self.num_std * std_dev;
        let lower = mean - self.num_std * std_dev;

        let position = if upper == lower {
            0.0
        } else {
            ((price - mean) / (upper - mean)).clamp(-1.0, 1.0)
        };

        Some(BollingerReading {
            mean,
            std_dev,
            upper,
            lower,
            position,
        })
    }
}
