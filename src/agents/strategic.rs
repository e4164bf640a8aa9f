//! Strategic agent: directional bias from the indicator composite.
//!
//! Each indicator casts a signed vote in [-1, 1] (positive favors long).
//! The composite is the weight-normalized sum of the votes; its magnitude is
//! the score and its sign picks the direction. A composite below the
//! threshold, or any indicator still warming up, yields a neutral signal.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::StrategicPolicy;
use crate::config::{SignalWeights, ThresholdConfig};
use crate::domain::{Direction, Level, Signal, Verdict};
use crate::indicators::{IndicatorState, MacdReading};

pub struct StrategicAgent {
    weights: SignalWeights,
    threshold: f64,
}

impl StrategicAgent {
    pub fn new(weights: SignalWeights, thresholds: &ThresholdConfig) -> Self {
        Self {
            weights,
            threshold: thresholds.signal_threshold,
        }
    }
}

/// RSI vote: distance from the 50 midline, scaled to [-1, 1].
fn rsi_vote(rsi: f64) -> f64 {
    ((rsi - 50.0) / 50.0).clamp(-1.0, 1.0)
}

/// MACD vote: histogram relative to the line magnitude. A flat line falls
/// back to a half-strength vote in the histogram's direction.
fn macd_vote(macd: &MacdReading) -> f64 {
    if macd.line != 0.0 {
        (macd.histogram / macd.line.abs()).clamp(-1.0, 1.0)
    } else if macd.histogram > 0.0 {
        0.5
    } else if macd.histogram < 0.0 {
        -0.5
    } else {
        0.0
    }
}

/// Stochastic vote: %K distance from the midline.
fn stochastic_vote(k: f64) -> f64 {
    ((k - 50.0) / 50.0).clamp(-1.0, 1.0)
}

impl StrategicPolicy for StrategicAgent {
    fn evaluate(&self, indicators: &IndicatorState, now: DateTime<Utc>, ttl: Duration) -> Signal {
        let (Some(rsi), Some(macd), Some(bollinger), Some(stochastic)) = (
            indicators.rsi,
            indicators.macd,
            indicators.bollinger,
            indicators.stochastic,
        ) else {
            return Signal::neutral(Level::Strategic, now, ttl, "indicators warming up");
        };

        let weight_sum = self.weights.sum();
        let composite = (self.weights.rsi * rsi_vote(rsi)
            + self.weights.macd * macd_vote(&macd)
            + self.weights.bollinger * bollinger.position
            + self.weights.stochastic * stochastic_vote(stochastic.k))
            / weight_sum;

        let score = composite.abs();
        debug!(composite, score, "strategic composite");
        if score < self.threshold {
            return Signal::neutral(
                Level::Strategic,
                now,
                ttl,
                format!("composite {score:.3} below threshold {:.3}", self.threshold),
            );
        }

        let direction = if composite > 0.0 {
            Direction::Long
        } else {
            Direction::Short
        };
        Signal::new(
            direction,
            score,
            score,
            Level::Strategic,
            Verdict::Pass,
            now,
            ttl,
            format!("composite {composite:.3}"),
        )
    }
}
