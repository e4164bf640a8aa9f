//! Stochastic oscillator (%K / %D) over a rolling price window.
//!
//! %K = 100 * (close - lowest) / (highest - lowest) over the last `k_period`
//! samples; %D is the simple average of the last `d_period` %K values.
//! A flat window reports %K = 50.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticReading {
    pub k: f64,
    pub d: f64,
}

/// Incremental Stochastic(k_period, d_period).
#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
    prices: VecDeque<f64>,
    k_values: VecDeque<f64>,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        assert!(k_period >= 1, "Stochastic %K period must be >= 1");
        assert!(d_period >= 1, "Stochastic %D period must be >= 1");
        Self {
            k_period,
            d_period,
            prices: VecDeque::with_capacity(k_period + 1),
            k_values: VecDeque::with_capacity(d_period + 1),
        }
    }

    /// Feed one sample. Returns a reading once both windows fill.
    pub fn update(&mut self, price: f64) -> Option<StochasticReading> {
        self.prices.push_back(price);
        if self.prices.len() > self.k_period {
            self.prices.pop_front();
        }
        if self.prices.len() < self.k_period {
            return None;
        }

        let mut low = f64::INFINITY;
        let mut high = f64::NEG_INFINITY;
        for &p in &self.prices {
            low = low.min(p);
            high = high.max(p);
        }

        let k = if high == low {
            50.0
        } else {
            100.0 * (price - low) / (high - low)
        };

        self.k_values.push_back(k);
        if self.k_values.len() > self.d_period {
            self.k_values.pop_front();
        }
        if self.k_values.len() < self.d_period {
            return None;
        }

        let d = self.k_values.iter().sum::<f64>() / self.d_period as f64;
        Some(StochasticReading { k, d })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    fn feed(stoch: &mut Stochastic, prices: &[f64]) -> Option<StochasticReading> {
        let mut last = None;
        for &p in prices {
            last = stoch.update(p);
        }
        last
    }

    #[test]
    fn not_ready_before_both_windows_fill() {
        let mut stoch = Stochastic::new(3, 2);
        assert!(stoch.update(10.0).is_none());
        assert!(stoch.update(11.0).is_none());
        // %K window full, %D still needs a second value
        assert!(stoch.update(12.0).is_none());
        assert!(stoch.update(13.0).is_some());
    }

    #[test]
    fn close_at_high_is_100() {
        let mut stoch = Stochastic::new(3, 1);
        let r = feed(&mut stoch, &[10.0, 11.0, 12.0]).unwrap();
        assert_approx(r.k, 100.0, 1e-10);
        assert_approx(r.d, 100.0, 1e-10);
    }

    #[test]
    fn close_at_low_is_0() {
        let mut stoch = Stochastic::new(3, 1);
        let r = feed(&mut stoch, &[12.0, 11.0, 10.0]).unwrap();
        assert_approx(r.k, 0.0, 1e-10);
    }

    #[test]
    fn flat_window_is_50() {
        let mut stoch = Stochastic::new(3, 1);
        let r = feed(&mut stoch, &[10.0, 10.0, 10.0]).unwrap();
        assert_approx(r.k, 50.0, 1e-10);
    }

    #[test]
    fn mid_range_value() {
        // Window [10, 14, 12]: low 10, high 14, close 12 -> %K = 50
        let mut stoch = Stochastic::new(3, 1);
        let r = feed(&mut stoch, &[10.0, 14.0, 12.0]).unwrap();
        assert_approx(r.k, 50.0, 1e-10);
    }

    #[test]
    fn d_averages_recent_k_values() {
        // %K at each step with k_period=2:
        //   [10,12] -> 100, [12,11] -> 0, [11,13] -> 100
        // %D(3) at the last step = (100 + 0 + 100)/3
        let mut stoch = Stochastic::new(2, 3);
        let r = feed(&mut stoch, &[10.0, 12.0, 11.0, 13.0]).unwrap();
        assert_approx(r.k, 100.0, 1e-10);
        assert_approx(r.d, 200.0 / 3.0, 1e-10);
    }
}
