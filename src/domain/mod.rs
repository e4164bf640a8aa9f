//! Domain types: market snapshots, signals, positions, closed trades.

pub mod position;
pub mod signal;
pub mod snapshot;
pub mod trade;

pub use position::{Position, Side, TrailingState};
pub use signal::{Direction, Level, Signal, Verdict};
pub use snapshot::{BookLevel, MarketSnapshot};
pub use trade::{ClosedTrade, ExitReason};
