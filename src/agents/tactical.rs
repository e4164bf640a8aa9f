//! Tactical agent: execution timing from order-book microstructure.
//!
//! Confirms a strategic direction only when the W-OBI z-score spikes in the
//! same direction, the spread is tight, and depth on the supporting side
//! holds up against the opposing side. Stale or incomplete book data fails
//! safe to a neutral signal.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::TacticalPolicy;
use crate::config::ThresholdConfig;
use crate::domain::{Direction, Level, MarketSnapshot, Signal, Verdict};
use crate::indicators::IndicatorState;

/// Everything one tactical evaluation reads.
pub struct TacticalInputs<'a> {
    pub snapshot: &'a MarketSnapshot,
    pub indicators: &'a IndicatorState,
    pub strategic: &'a Signal,
}

pub struct TacticalAgent {
    thresholds: ThresholdConfig,
}

impl TacticalAgent {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }
}

impl TacticalPolicy for TacticalAgent {
    fn evaluate(&self, inputs: &TacticalInputs<'_>, now: DateTime<Utc>, ttl: Duration) -> Signal {
        let direction = inputs.strategic.direction;
        if !direction.is_directional() {
            return Signal::neutral(Level::Tactical, now, ttl, "no strategic direction");
        }

        let age = now - inputs.snapshot.timestamp;
        if age > Duration::seconds(self.thresholds.book_freshness_secs) {
            return Signal::neutral(
                Level::Tactical,
                now,
                ttl,
                format!("book stale: {}s old", age.num_seconds()),
            );
        }

        let Some(wobi) = inputs.indicators.wobi else {
            return Signal::neutral(Level::Tactical, now, ttl, "no imbalance reading");
        };

        let Some(spread) = inputs.snapshot.spread_fraction() else {
            return Signal::neutral(Level::Tactical, now, ttl, "one-sided book");
        };
        if spread > self.thresholds.max_spread_fraction {
            return Signal::neutral(
                Level::Tactical,
                now,
                ttl,
                format!("spread {spread:.5} too wide"),
            );
        }

        // The imbalance must spike in the strategic direction
        let aligned_z = wobi.zscore * direction.sign();
        if aligned_z <= self.thresholds.zscore_threshold {
            return Signal::neutral(
                Level::Tactical,
                now,
                ttl,
                format!("zscore {:.2} not confirming", wobi.zscore),
            );
        }

        let levels = self.thresholds.depth_check_levels;
        let (supporting, opposing) = match direction {
            Direction::Long => (
                inputs.snapshot.bid_depth(levels),
                inputs.snapshot.ask_depth(levels),
            ),
            _ => (
                inputs.snapshot.ask_depth(levels),
                inputs.snapshot.bid_depth(levels),
            ),
        };
        if opposing > 0.0 && supporting / opposing < self.thresholds.depth_support_min {
            return Signal::neutral(
                Level::Tactical,
                now,
                ttl,
                format!("depth ratio {:.2} against direction", supporting / opposing),
            );
        }

        // Blend timing quality with the strategic score
        let score = 0.6 * (wobi.zscore.abs() / 5.0).min(1.0) + 0.4 * inputs.strategic.score;
        debug!(zscore = wobi.zscore, spread, score, "tactical confirm");
        Signal::new(
            direction,
            score,
            score,
            Level::Tactical,
            Verdict::Pass,
            now,
            ttl,
            format!("zscore {:.2}, spread {spread:.5}", wobi.zscore),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BookLevel;
    use crate::indicators::WobiReading;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn snapshot(age_secs: i64) -> MarketSnapshot {
        MarketSnapshot {
            symbol: "BTC/USDT".into(),
            timestamp: now() - Duration::seconds(age_secs),
            bids: vec![BookLevel::new(99.99, 5.0), BookLevel::new(99.98, 5.0)],
            asks: vec![BookLevel::new(100.01, 5.0), BookLevel::new(100.02, 5.0)],
            last_price: 100.0,
            last_size: 1.0,
        }
    }

    fn indicators(zscore: f64) -> IndicatorState {
        IndicatorState {
            samples: 100,
            wobi: Some(WobiReading { wobi: 0.3, zscore }),
            ..IndicatorState::default()
        }
    }

    fn strategic(direction: Direction) -> Signal {
        Signal::new(
            direction,
            0.8,
            0.8,
            Level::Strategic,
            Verdict::Pass,
            now(),
            Duration::seconds(30),
            "test",
        )
    }

    fn eval(snapshot: &MarketSnapshot, indicators: &IndicatorState, strategic: &Signal) -> Signal {
        let agent = TacticalAgent::new(ThresholdConfig::default());
        let inputs = TacticalInputs {
            snapshot,
            indicators,
            strategic,
        };
        agent.evaluate(&inputs, now(), Duration::seconds(10))
    }

    #[test]
    fn confirms_aligned_spike() {
        let sig = eval(&snapshot(0), &indicators(3.0), &strategic(Direction::Long));
        assert_eq!(sig.direction, Direction::Long);
        assert_eq!(sig.verdict, Verdict::Pass);
        // 0.6 * 3/5 + 0.4 * 0.8 = 0.68
        assert!((sig.score - 0.68).abs() < 1e-12);
    }

    #[test]
    fn confirms_short_on_negative_spike() {
        let sig = eval(&snapshot(0), &indicators(-3.0), &strategic(Direction::Short));
        assert_eq!(sig.direction, Direction::Short);
    }

    #[test]
    fn neutral_strategic_yields_neutral() {
        let sig = eval(&snapshot(0), &indicators(3.0), &strategic(Direction::Neutral));
        assert_eq!(sig.direction, Direction::Neutral);
    }

    #[test]
    fn stale_book_fails_safe() {
        let sig = eval(&snapshot(6), &indicators(3.0), &strategic(Direction::Long));
        assert_eq!(sig.direction, Direction::Neutral);
        assert!(sig.reason.contains("stale"));
    }

    #[test]
    fn weak_zscore_rejected() {
        let sig = eval(&snapshot(0), &indicators(1.5), &strategic(Direction::Long));
        assert_eq!(sig.direction, Direction::Neutral);
        assert!(sig.reason.contains("not confirming"));
    }

    #[test]
    fn opposing_spike_rejected() {
        // Strong sell pressure cannot confirm a long
        let sig = eval(&snapshot(0), &indicators(-3.0), &strategic(Direction::Long));
        assert_eq!(sig.direction, Direction::Neutral);
    }

    #[test]
    fn wide_spread_rejected() {
        let mut snap = snapshot(0);
        snap.bids[0].price = 99.8;
        snap.asks[0].price = 100.2;
        let sig = eval(&snap, &indicators(3.0), &strategic(Direction::Long));
        assert!(sig.reason.contains("spread"));
    }

    #[test]
    fn thin_supporting_depth_rejected() {
        let mut snap = snapshot(0);
        for level in &mut snap.bids {
            level.size = 1.0;
        }
        // bid depth 2 vs ask depth 10: ratio 0.2 < 0.67
        let sig = eval(&snap, &indicators(3.0), &strategic(Direction::Long));
        assert!(sig.reason.contains("depth ratio"));
    }

    #[test]
    fn missing_wobi_fails_safe() {
        let state = IndicatorState::default();
        let sig = eval(&snapshot(0), &state, &strategic(Direction::Long));
        assert!(sig.reason.contains("no imbalance"));
    }
}
