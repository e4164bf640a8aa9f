//! Trading lifecycle events and the passive observability boundary.
//!
//! Dashboards and remote-control frontends subscribe here; they never mutate
//! core state directly. Control actions flow back in only through
//! `RiskManager`'s public API.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{ExitReason, Side};

/// Events emitted by the risk manager and position store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TradingEvent {
    PositionOpened {
        symbol: String,
        side: Side,
        size: f64,
        price: f64,
        at: DateTime<Utc>,
    },
    PositionClosed {
        symbol: String,
        net_pnl: f64,
        reason: ExitReason,
        at: DateTime<Utc>,
    },
    EmergencyStop {
        reason: String,
        at: DateTime<Utc>,
    },
    EmergencyCleared {
        at: DateTime<Utc>,
    },
    DailyReset {
        at: DateTime<Utc>,
    },
}

/// Passive event subscriber.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &TradingEvent);
}

/// Drops all events.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: &TradingEvent) {}
}

/// Logs events through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn publish(&self, event: &TradingEvent) {
        match event {
            TradingEvent::PositionOpened {
                symbol,
                side,
                size,
                price,
                ..
            } => info!(%symbol, ?side, size, price, "position opened"),
            TradingEvent::PositionClosed {
                symbol,
                net_pnl,
                reason,
                ..
            } => info!(%symbol, net_pnl, reason = reason.label(), "position closed"),
            TradingEvent::EmergencyStop { reason, .. } => {
                warn!(%reason, "emergency stop activated")
            }
            TradingEvent::EmergencyCleared { .. } => info!("emergency stop cleared"),
            TradingEvent::DailyReset { .. } => info!("daily risk state reset"),
        }
    }
}

/// Buffers events in memory; used by tests and embedding frontends.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TradingEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<TradingEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: &TradingEvent) {
        self.events.lock().push(event.clone());
    }
}
