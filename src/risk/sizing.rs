//! Dynamic position sizing.
//!
//! The order size is the base size scaled by four factor curves: realized
//! volatility, signal confidence, trade-level Sharpe, and the current losing
//! streak. Each curve is a piecewise-linear table interpolated between
//! anchors and held flat outside them. The combined multiplier is clamped to
//! [0.2, 1.5] before the per-position notional cap applies.

use thiserror::Error;
use tracing::debug;

use crate::config::RiskLimits;

pub const MIN_MULTIPLIER: f64 = 0.2;
pub const MAX_MULTIPLIER: f64 = 1.5;

/// Volatility curve: calm markets trade full size, stressed markets shrink.
const VOLATILITY_ANCHORS: &[(f64, f64)] = &[
    (0.00, 1.00),
    (0.01, 1.00),
    (0.03, 0.67),
    (0.05, 0.50),
    (0.10, 0.33),
];

/// Confidence curve: weak signals trade small even when everything else is
/// favorable.
const CONFIDENCE_ANCHORS: &[(f64, f64)] = &[(0.0, 0.2), (0.5, 0.5), (1.0, 1.0)];

/// Sharpe curve: a cold book trades smaller, a hot book is allowed to press.
const SHARPE_ANCHORS: &[(f64, f64)] = &[
    (-1.0, 0.50),
    (0.0, 0.80),
    (1.0, 1.00),
    (1.5, 1.20),
    (3.0, 1.50),
];

/// Losing-streak curve.
const STREAK_ANCHORS: &[(f64, f64)] = &[
    (0.0, 1.0),
    (1.0, 0.9),
    (2.0, 0.7),
    (3.0, 0.5),
    (5.0, 0.3),
];

#[derive(Debug, Error, PartialEq)]
pub enum SizingError {
    #[error("realized volatility unavailable, refusing to size")]
    VolatilityUnavailable,
    #[error("base order size must be positive, got {0}")]
    NonPositiveBase(f64),
}

/// Inputs to one sizing decision.
#[derive(Debug, Clone, Copy)]
pub struct SizingInputs {
    pub volatility: Option<f64>,
    pub confidence: f64,
    /// `None` until enough trade history accumulates; treated as neutral.
    pub sharpe: Option<f64>,
    pub consecutive_losses: u32,
}

/// Piecewise-linear lookup over sorted anchors, flat beyond the ends.
fn interpolate(anchors: &[(f64, f64)], x: f64) -> f64 {
    let (first_x, first_y) = anchors[0];
    if x <= first_x {
        return first_y;
    }
    for pair in anchors.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            let t = (x - x0) / (x1 - x0);
            return y0 + t * (y1 - y0);
        }
    }
    anchors[anchors.len() - 1].1
}

/// Compute the order notional for one approved decision.
pub fn size_position(
    base_size: f64,
    inputs: SizingInputs,
    limits: &RiskLimits,
) -> Result<f64, SizingError> {
    if base_size <= 0.0 {
        return Err(SizingError::NonPositiveBase(base_size));
    }
    let volatility = inputs
        .volatility
        .ok_or(SizingError::VolatilityUnavailable)?;

    let f_vol = interpolate(VOLATILITY_ANCHORS, volatility);
    let f_conf = interpolate(CONFIDENCE_ANCHORS, inputs.confidence.clamp(0.0, 1.0));
    let f_sharpe = inputs
        .sharpe
        .map(|s| interpolate(SHARPE_ANCHORS, s))
        .unwrap_or(1.0);
    let f_streak = interpolate(STREAK_ANCHORS, inputs.consecutive_losses as f64);

    let multiplier = (f_vol * f_conf * f_sharpe * f_streak).clamp(MIN_MULTIPLIER, MAX_MULTIPLIER);
    let size = (base_size * multiplier).min(limits.max_position_size);

    debug!(
        f_vol,
        f_conf, f_sharpe, f_streak, multiplier, size, "position sized"
    );
    Ok(size)
}
