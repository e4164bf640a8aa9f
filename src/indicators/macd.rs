//! MACD: fast EMA minus slow EMA, with a true signal line.
//!
//! The signal line is the EMA of the MACD *series* (seeded from the first
//! `signal_period` MACD values), not an approximation over recent prices.
//! Histogram = MACD - signal.

use serde::{Deserialize, Serialize};

use super::ema::Ema;

/// One complete MACD observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Incremental MACD(fast, slow, signal).
#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    reading: Option<MacdReading>,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast < slow, "MACD fast period must be shorter than slow");
        Self {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
            reading: None,
        }
    }

    /// Feed one price sample. O(1); returns a reading once the slow EMA and
    /// the signal EMA over the MACD series are both seeded.
    pub fn update(&mut self, price: f64) -> Option<MacdReading> {
        let fast = self.fast.update(price);
        let slow = self.slow.update(price);

        let (Some(fast), Some(slow)) = (fast, slow) else {
            return None;
        };

        let line = fast - slow;
        let signal = self.signal.update(line)?;
        let reading = MacdReading {
            line,
            signal,
            histogram: line - signal,
        };
        self.reading = Some(reading);
        self.reading
    }

    pub fn reading(&self) -> Option<MacdReading> {
        self.reading
    }

    pub fn fast_value(&self) -> Option<f64> {
        self.fast.value()
    }

    pub fn slow_value(&self) -> Option<f64> {
        self.slow.value()
    }
}
