//! Aggregate statistics over a closed-trade log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::ClosedTrade;

const ANNUALIZATION: f64 = 252.0;

/// Summary of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestStats {
    pub trade_count: usize,
    pub winners: usize,
    pub losers: usize,
    /// Fraction of trades with positive net PnL; 0 when no trades.
    pub win_rate: f64,
    pub total_net_pnl: f64,
    pub total_fees: f64,
    pub total_slippage: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// Gross profit over gross loss; `None` when there are no losers.
    pub profit_factor: Option<f64>,
    /// Annualized Sharpe over per-trade net PnLs; `None` without dispersion.
    pub sharpe: Option<f64>,
    /// Deepest drop of the cumulative PnL curve below its running peak.
    pub max_drawdown: f64,
    pub avg_holding_seconds: f64,
    /// Trade count per exit reason label, ordered by label.
    pub exit_reasons: BTreeMap<String, usize>,
}

impl BacktestStats {
    pub fn from_trades(trades: &[ClosedTrade]) -> Self {
        let trade_count = trades.len();
        let winners = trades.iter().filter(|t| t.is_winner()).count();
        let losers = trades.iter().filter(|t| t.net_pnl < 0.0).count();

        let total_net_pnl: f64 = trades.iter().map(|t| t.net_pnl).sum();
        let total_fees: f64 = trades.iter().map(|t| t.fees).sum();
        let total_slippage: f64 = trades.iter().map(|t| t.slippage).sum();

        let win_sum: f64 = trades
            .iter()
            .filter(|t| t.is_winner())
            .map(|t| t.net_pnl)
            .sum();
        let loss_sum: f64 = trades
            .iter()
            .filter(|t| t.net_pnl < 0.0)
            .map(|t| t.net_pnl)
            .sum();

        let avg_win = if winners > 0 {
            win_sum / winners as f64
        } else {
            0.0
        };
        let avg_loss = if losers > 0 {
            loss_sum / losers as f64
        } else {
            0.0
        };
        let profit_factor = if loss_sum < 0.0 {
            Some(win_sum / -loss_sum)
        } else {
            None
        };

        let mut exit_reasons = BTreeMap::new();
        for trade in trades {
            *exit_reasons
                .entry(trade.exit_reason.label().to_string())
                .or_insert(0) += 1;
        }

        let avg_holding_seconds = if trade_count > 0 {
            trades.iter().map(|t| t.holding_seconds).sum::<f64>() / trade_count as f64
        } else {
            0.0
        };

        Self {
            trade_count,
            winners,
            losers,
            win_rate: if trade_count > 0 {
                winners as f64 / trade_count as f64
            } else {
                0.0
            },
            total_net_pnl,
            total_fees,
            total_slippage,
            avg_win,
            avg_loss,
            profit_factor,
            sharpe: pnl_sharpe(trades),
            max_drawdown: max_drawdown(trades),
            avg_holding_seconds,
            exit_reasons,
        }
    }
}

fn pnl_sharpe(trades: &[ClosedTrade]) -> Option<f64> {
    if trades.len() < 2 {
        return None;
    }
    let n = trades.len() as f64;
    let mean = trades.iter().map(|t| t.net_pnl).sum::<f64>() / n;
    let variance = trades
        .iter()
        .map(|t| (t.net_pnl - mean) * (t.net_pnl - mean))
        .sum::<f64>()
        / n;
    let std = variance.sqrt();
    if std == 0.0 {
        return None;
    }
    Some(mean / std * ANNUALIZATION.sqrt())
}

fn max_drawdown(trades: &[ClosedTrade]) -> f64 {
    let mut equity = 0.0;
    let mut peak = 0.0f64;
    let mut worst = 0.0f64;
    for trade in trades {
        equity += trade.net_pnl;
        peak = peak.max(equity);
        worst = worst.max(peak - equity);
    }
    worst
}
