//! Macro gate: portfolio health decides whether trading is allowed at all.
//!
//! A pure evaluator over the risk snapshot. Blocks on emergency stop, daily
//! loss breach, losing streak, or a Sharpe below the floor once enough trades
//! exist. Checks run in severity order; the first hit wins.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::MacroPolicy;
use crate::config::RiskLimits;
use crate::domain::{Direction, Level, Signal, Verdict};
use crate::risk::RiskSnapshot;

pub struct MacroFilterAgent {
    limits: RiskLimits,
}

impl MacroFilterAgent {
    pub fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }
}

impl MacroPolicy for MacroFilterAgent {
    fn evaluate(&self, risk: &RiskSnapshot, now: DateTime<Utc>, ttl: Duration) -> Signal {
        if risk.emergency_stop {
            return Signal::block(now, ttl, "emergency stop active");
        }
        if risk.daily_pnl <= -self.limits.daily_loss_limit {
            return Signal::block(
                now,
                ttl,
                format!(
                    "daily loss limit: pnl {:.2} <= -{:.2}",
                    risk.daily_pnl, self.limits.daily_loss_limit
                ),
            );
        }
        if risk.consecutive_losses >= self.limits.max_consecutive_losses {
            return Signal::block(
                now,
                ttl,
                format!("losing streak: {} consecutive losses", risk.consecutive_losses),
            );
        }
        if risk.trade_count >= self.limits.min_trades_for_sharpe {
            if let Some(sharpe) = risk.sharpe {
                if sharpe < self.limits.sharpe_floor {
                    return Signal::block(
                        now,
                        ttl,
                        format!("sharpe {:.2} below floor {:.2}", sharpe, self.limits.sharpe_floor),
                    );
                }
            }
        }

        // Confidence centers at 0.8 and drifts with realized Sharpe
        let confidence = match risk.sharpe {
            Some(sharpe) => (0.8 + (sharpe - 1.0) * 0.1).clamp(0.0, 1.0),
            None => 0.8,
        };
        debug!(confidence, "macro pass");
        Signal::new(
            Direction::Neutral,
            confidence,
            confidence,
            Level::Macro,
            Verdict::Pass,
            now,
            ttl,
            "risk checks passed",
        )
    }
}
