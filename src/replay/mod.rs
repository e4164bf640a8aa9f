//! Deterministic historical replay.
//!
//! Drives the exact live decision path (indicators, orchestrator, risk,
//! position store) from a recorded tick stream under a virtual clock. The
//! same input stream always produces byte-identical trade logs.

pub mod engine;
pub mod report;
pub mod source;
pub mod stats;

pub use engine::{BacktestReplayEngine, BacktestRun};
pub use report::{log_digest, write_trades_csv, write_trades_jsonl};
pub use source::{JsonlTickSource, ReplayError, TickRecord};
pub use stats::BacktestStats;
