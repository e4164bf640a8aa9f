//! Risk state tracking and dynamic position sizing.

pub mod manager;
pub mod sizing;

pub use manager::{RiskManager, RiskSnapshot};
pub use sizing::{size_position, SizingError, SizingInputs};
