//! Exponential Moving Average (EMA), incremental form.
//!
//! Recursive: EMA[t] = alpha * price[t] + (1 - alpha) * EMA[t-1]
//! Seed: SMA of the first `period` samples.
//! Reports `None` until the seed window fills.

/// Incremental EMA over a streaming price series.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    seed_count: usize,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seed_count: 0,
            value: None,
        }
    }

    /// Feed one sample. O(1); returns the EMA once seeded.
    pub fn update(&mut self, price: f64) -> Option<f64> {
        match self.value {
            Some(prev) => {
                let next = self.alpha * price + (1.0 - self.alpha) * prev;
                self.value = Some(next);
                self.value
            }
            None => {
                self.seed_sum += price;
                self.seed_count += 1;
                if self.seed_count == self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
                self.value
            }
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn period(&self) -> usize {
        self.period
    }
}
