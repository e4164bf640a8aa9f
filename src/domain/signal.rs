//! Time-bounded trading signals.
//!
//! A signal is immutable once created and carries its own validity window:
//! `is_valid(now)` holds iff `now - created_at < ttl`. TTLs shrink down the
//! hierarchy (macro 60s, strategic 30s, tactical 10s) because the inputs each
//! level reads decay at different speeds.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Proposed trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
    Neutral,
}

impl Direction {
    pub fn is_directional(&self) -> bool {
        !matches!(self, Direction::Neutral)
    }

    /// +1 for long, -1 for short, 0 for neutral.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
            Direction::Neutral => 0.0,
        }
    }
}

/// Decision level in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Macro,
    Strategic,
    Tactical,
}

impl Level {
    /// Default validity window per level.
    pub fn default_ttl(&self) -> Duration {
        match self {
            Level::Macro => Duration::seconds(60),
            Level::Strategic => Duration::seconds(30),
            Level::Tactical => Duration::seconds(10),
        }
    }
}

/// Macro gate outcome. The macro level never proposes a direction; it only
/// allows or blocks further evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Block,
}

/// One immutable evaluation result from a decision level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    /// Evaluation strength, clamped to [0, 1].
    pub score: f64,
    /// Self-assessed reliability, clamped to [0, 1].
    pub confidence: f64,
    pub level: Level,
    pub verdict: Verdict,
    pub created_at: DateTime<Utc>,
    /// Validity window in whole seconds.
    pub ttl_seconds: i64,
    /// Why the signal came out this way, for the decision trace.
    pub reason: String,
}

impl Signal {
    /// Build a signal, clamping score and confidence into [0, 1].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        direction: Direction,
        score: f64,
        confidence: f64,
        level: Level,
        verdict: Verdict,
        created_at: DateTime<Utc>,
        ttl: Duration,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            direction,
            score: score.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            level,
            verdict,
            created_at,
            ttl_seconds: ttl.num_seconds(),
            reason: reason.into(),
        }
    }

    /// A blocking macro signal.
    pub fn block(created_at: DateTime<Utc>, ttl: Duration, reason: impl Into<String>) -> Self {
        Self::new(
            Direction::Neutral,
            0.0,
            0.0,
            Level::Macro,
            Verdict::Block,
            created_at,
            ttl,
            reason,
        )
    }

    /// A neutral "no opportunity" signal at the given level.
    pub fn neutral(
        level: Level,
        created_at: DateTime<Utc>,
        ttl: Duration,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            Direction::Neutral,
            0.0,
            0.0,
            level,
            Verdict::Pass,
            created_at,
            ttl,
            reason,
        )
    }

    pub fn is_blocked(&self) -> bool {
        self.verdict == Verdict::Block
    }

    /// True while the elapsed time since creation is strictly below the TTL.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at < Duration::seconds(self.ttl_seconds)
    }

    /// Seconds of validity left, floored at zero.
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = (now - self.created_at).num_milliseconds() as f64 / 1000.0;
        (self.ttl_seconds as f64 - elapsed).max(0.0)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::seconds(self.ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn sample(level: Level) -> Signal {
        Signal::new(
            Direction::Long,
            0.8,
            0.7,
            level,
            Verdict::Pass,
            t0(),
            level.default_ttl(),
            "test",
        )
    }

    #[test]
    fn valid_one_second_before_expiry() {
        let sig = sample(Level::Strategic);
        assert!(sig.is_valid(t0() + Duration::seconds(29)));
    }

    #[test]
    fn expired_at_and_after_ttl() {
        let sig = sample(Level::Strategic);
        assert!(!sig.is_valid(t0() + Duration::seconds(30)));
        assert!(!sig.is_valid(t0() + Duration::seconds(31)));
    }

    #[test]
    fn per_level_default_ttls() {
        assert_eq!(Level::Macro.default_ttl(), Duration::seconds(60));
        assert_eq!(Level::Strategic.default_ttl(), Duration::seconds(30));
        assert_eq!(Level::Tactical.default_ttl(), Duration::seconds(10));
    }

    #[test]
    fn score_and_confidence_clamped() {
        let sig = Signal::new(
            Direction::Short,
            1.7,
            -0.4,
            Level::Tactical,
            Verdict::Pass,
            t0(),
            Duration::seconds(10),
            "clamp",
        );
        assert_eq!(sig.score, 1.0);
        assert_eq!(sig.confidence, 0.0);
    }

    #[test]
    fn remaining_ttl_floors_at_zero() {
        let sig = sample(Level::Tactical);
        assert_eq!(sig.remaining_ttl(t0() + Duration::seconds(4)), 6.0);
        assert_eq!(sig.remaining_ttl(t0() + Duration::seconds(60)), 0.0);
    }

    #[test]
    fn block_signal_shape() {
        let sig = Signal::block(t0(), Duration::seconds(60), "emergency stop");
        assert!(sig.is_blocked());
        assert_eq!(sig.direction, Direction::Neutral);
        assert_eq!(sig.score, 0.0);
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::Short.sign(), -1.0);
        assert_eq!(Direction::Neutral.sign(), 0.0);
    }
}
