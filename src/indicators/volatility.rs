//! Realized volatility: population standard deviation of simple returns
//! over a rolling window. Needs `window + 1` prices before reporting.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ReturnsVolatility {
    window_len: usize,
    prev_price: Option<f64>,
    returns: VecDeque<f64>,
}

impl ReturnsVolatility {
    pub fn new(window_len: usize) -> Self {
        assert!(window_len >= 2, "volatility window must be >= 2");
        Self {
            window_len,
            prev_price: None,
            returns: VecDeque::with_capacity(window_len + 1),
        }
    }

    pub fn update(&mut self, price: f64) -> Option<f64> {
        let prev = match self.prev_price.replace(price) {
            Some(prev) => prev,
            None => return None,
        };
        if prev <= 0.0 {
            return self.value();
        }

        self.returns.push_back(price / prev - 1.0);
        if self.returns.len() > self.window_len {
            self.returns.pop_front();
        }
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        if self.returns.len() < self.window_len {
            return None;
        }
        // Two-pass over the bounded window: rolling sum-of-squares cancels
        // catastrophically when returns are near-constant
        let n = self.returns.len() as f64;
        let mean = self.returns.iter().sum::<f64>() / n;
        let variance = self
            .returns
            .iter()
            .map(|r| (r - mean) * (r - mean))
            .sum::<f64>()
            / n;
        Some(variance.sqrt())
    }
}
