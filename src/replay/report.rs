//! Trade-log export and the determinism digest.
//!
//! The digest hashes the canonical JSONL rendering of the trade log, so two
//! replay runs over the same tick stream can be compared with one string.

use std::io::Write;

use crate::domain::ClosedTrade;
use crate::replay::ReplayError;

/// Serialize trades as JSONL, one object per line.
pub fn write_trades_jsonl(trades: &[ClosedTrade], mut writer: impl Write) -> Result<(), ReplayError> {
    for trade in trades {
        let line = serde_json::to_string(trade).map_err(ReplayError::Serialize)?;
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Export trades as CSV with a header row.
pub fn write_trades_csv(trades: &[ClosedTrade], writer: impl Write) -> Result<(), ReplayError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "symbol",
        "side",
        "entry_time",
        "exit_time",
        "entry_price",
        "exit_price",
        "quantity",
        "size",
        "gross_pnl",
        "fees",
        "slippage",
        "net_pnl",
        "holding_seconds",
        "exit_reason",
        "signal_confidence",
    ])?;
    for trade in trades {
        csv_writer.write_record([
            trade.symbol.clone(),
            format!("{:?}", trade.side),
            trade.entry_time.to_rfc3339(),
            trade.exit_time.to_rfc3339(),
            trade.entry_price.to_string(),
            trade.exit_price.to_string(),
            trade.quantity.to_string(),
            trade.size.to_string(),
            trade.gross_pnl.to_string(),
            trade.fees.to_string(),
            trade.slippage.to_string(),
            trade.net_pnl.to_string(),
            trade.holding_seconds.to_string(),
            trade.exit_reason.label().to_string(),
            trade.signal_confidence.to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// BLAKE3 hex digest of the canonical JSONL trade log.
pub fn log_digest(trades: &[ClosedTrade]) -> String {
    let mut hasher = blake3::Hasher::new();
    let mut buf = Vec::new();
    // Serialization of our own types cannot fail
    if write_trades_jsonl(trades, &mut buf).is_ok() {
        hasher.update(&buf);
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitReason, Side};
    use chrono::{Duration, TimeZone, Utc};

    fn trade(net_pnl: f64) -> ClosedTrade {
        let entry = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        ClosedTrade {
            symbol: "BTC/USDT".into(),
            side: Side::Long,
            entry_time: entry,
            exit_time: entry + Duration::seconds(42),
            entry_price: 100.0,
            exit_price: 100.2,
            quantity: 10.0,
            size: 1000.0,
            gross_pnl: net_pnl + 0.5,
            fees: 0.3,
            slippage: 0.2,
            net_pnl,
            holding_seconds: 42.0,
            exit_reason: ExitReason::TakeProfit,
            signal_confidence: 0.8,
        }
    }

    #[test]
    fn jsonl_has_one_line_per_trade() {
        let trades = vec![trade(1.0), trade(2.0)];
        let mut buf = Vec::new();
        write_trades_jsonl(&trades, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().next().unwrap().contains("\"take_profit\""));
    }

    #[test]
    fn csv_has_header_and_rows() {
        let trades = vec![trade(1.0)];
        let mut buf = Vec::new();
        write_trades_csv(&trades, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("symbol,side,"));
        assert!(lines.next().unwrap().starts_with("BTC/USDT,Long,"));
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let trades = vec![trade(1.0), trade(2.0)];
        assert_eq!(log_digest(&trades), log_digest(&trades));
        let reordered = vec![trade(2.0), trade(1.0)];
        assert_ne!(log_digest(&trades), log_digest(&reordered));
        assert_ne!(log_digest(&trades), log_digest(&[]));
    }
}
