//! Concurrency-safe open-position store.
//!
//! One position per symbol, a portfolio-wide position count cap, and a total
//! exposure cap, all enforced atomically under a single lock so two racing
//! approvals cannot both slip through.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

use crate::config::RiskLimits;
use crate::domain::Position;
use crate::events::{EventSink, TradingEvent};

#[derive(Debug, Error, PartialEq)]
pub enum OpenRejected {
    #[error("position already open for {0}")]
    SymbolAlreadyOpen(String),
    #[error("max open positions reached ({0})")]
    MaxPositionsReached(usize),
    #[error("exposure cap exceeded: {requested:.2} would push total past {cap:.2}")]
    ExposureCapExceeded { requested: f64, cap: f64 },
}

#[derive(Debug, Default)]
struct Inner {
    positions: HashMap<String, Position>,
    total_exposure: f64,
}

pub struct PositionStore {
    limits: RiskLimits,
    sink: Arc<dyn EventSink>,
    inner: Mutex<Inner>,
}

impl PositionStore {
    pub fn new(limits: RiskLimits, sink: Arc<dyn EventSink>) -> Self {
        Self {
            limits,
            sink,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Admit a new position if every cap allows it. Check-and-insert happens
    /// under one lock acquisition.
    pub fn try_open(&self, position: Position) -> Result<(), OpenRejected> {
        let mut inner = self.inner.lock();
        if inner.positions.contains_key(&position.symbol) {
            return Err(OpenRejected::SymbolAlreadyOpen(position.symbol.clone()));
        }
        if inner.positions.len() >= self.limits.max_positions {
            return Err(OpenRejected::MaxPositionsReached(self.limits.max_positions));
        }
        let exposure = position.exposure();
        if inner.total_exposure + exposure > self.limits.max_total_exposure {
            return Err(OpenRejected::ExposureCapExceeded {
                requested: exposure,
                cap: self.limits.max_total_exposure,
            });
        }

        info!(symbol = %position.symbol, side = ?position.side, size = position.size, "position opened");
        self.sink.publish(&TradingEvent::PositionOpened {
            symbol: position.symbol.clone(),
            side: position.side,
            size: position.size,
            price: position.entry_price,
            at: position.opened_at,
        });
        inner.total_exposure += exposure;
        inner.positions.insert(position.symbol.clone(), position);
        Ok(())
    }

    /// Remove and return the position for a symbol, releasing its exposure.
    pub fn close(&self, symbol: &str) -> Option<Position> {
        let mut inner = self.inner.lock();
        let position = inner.positions.remove(symbol)?;
        inner.total_exposure = (inner.total_exposure - position.exposure()).max(0.0);
        Some(position)
    }

    /// Remove every open position, e.g. on emergency stop.
    pub fn flatten_all(&self) -> Vec<Position> {
        let mut inner = self.inner.lock();
        inner.total_exposure = 0.0;
        inner.positions.drain().map(|(_, p)| p).collect()
    }

    /// Ratchet the trailing watermark for a symbol against a new price.
    /// No-op when the symbol has no position or trailing is disabled on it.
    pub fn update_trailing(&self, symbol: &str, price: f64) {
        let mut inner = self.inner.lock();
        if let Some(position) = inner.positions.get_mut(symbol) {
            let side = position.side;
            if let Some(trailing) = position.trailing.as_mut() {
                trailing.ratchet(price, side);
            }
        }
    }

    pub fn get(&self, symbol: &str) -> Option<Position> {
        self.inner.lock().positions.get(symbol).cloned()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.inner.lock().positions.contains_key(symbol)
    }

    pub fn count(&self) -> usize {
        self.inner.lock().positions.len()
    }

    pub fn total_exposure(&self) -> f64 {
        self.inner.lock().total_exposure
    }

    pub fn symbols(&self) -> Vec<String> {
        self.inner.lock().positions.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Side, TrailingState};
    use crate::events::NullSink;
    use chrono::{TimeZone, Utc};

    fn position(symbol: &str, size: f64) -> Position {
        let opened_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Position {
            symbol: symbol.to_string(),
            side: Side::Long,
            entry_price: 100.0,
            size,
            quantity: size / 100.0,
            entry_fee: 0.0,
            opened_at,
            take_profit: 100.15,
            stop_loss: 99.9,
            trailing: None,
            signal_confidence: 0.8,
        }
    }

    fn store(max_positions: usize, max_total_exposure: f64) -> PositionStore {
        let limits = RiskLimits {
            max_positions,
            max_total_exposure,
            ..RiskLimits::default()
        };
        PositionStore::new(limits, Arc::new(NullSink))
    }

    #[test]
    fn open_and_close_round_trip() {
        let store = store(3, 10_000.0);
        store.try_open(position("BTC/USDT", 1000.0)).unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(store.total_exposure(), 1000.0);

        let closed = store.close("BTC/USDT").unwrap();
        assert_eq!(closed.symbol, "BTC/USDT");
        assert_eq!(store.count(), 0);
        assert_eq!(store.total_exposure(), 0.0);
    }

    #[test]
    fn duplicate_symbol_rejected() {
        let store = store(3, 10_000.0);
        store.try_open(position("BTC/USDT", 1000.0)).unwrap();
        let err = store.try_open(position("BTC/USDT", 500.0)).unwrap_err();
        assert!(matches!(err, OpenRejected::SymbolAlreadyOpen(_)));
        assert_eq!(store.total_exposure(), 1000.0);
    }

    #[test]
    fn position_count_cap() {
        let store = store(2, 100_000.0);
        store.try_open(position("BTC/USDT", 1000.0)).unwrap();
        store.try_open(position("ETH/USDT", 1000.0)).unwrap();
        let err = store.try_open(position("SOL/USDT", 1000.0)).unwrap_err();
        assert_eq!(err, OpenRejected::MaxPositionsReached(2));
    }

    #[test]
    fn exposure_cap() {
        let store = store(5, 2500.0);
        store.try_open(position("BTC/USDT", 1000.0)).unwrap();
        store.try_open(position("ETH/USDT", 1000.0)).unwrap();
        let err = store.try_open(position("SOL/USDT", 1000.0)).unwrap_err();
        assert!(matches!(err, OpenRejected::ExposureCapExceeded { .. }));
        // A smaller order still fits
        store.try_open(position("SOL/USDT", 400.0)).unwrap();
    }

    #[test]
    fn flatten_all_releases_everything() {
        let store = store(5, 100_000.0);
        store.try_open(position("BTC/USDT", 1000.0)).unwrap();
        store.try_open(position("ETH/USDT", 2000.0)).unwrap();

        let mut flattened = store.flatten_all();
        flattened.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        assert_eq!(flattened.len(), 2);
        assert_eq!(store.count(), 0);
        assert_eq!(store.total_exposure(), 0.0);
    }

    #[test]
    fn trailing_watermark_ratchets_through_store() {
        let store = store(3, 10_000.0);
        let mut p = position("BTC/USDT", 1000.0);
        p.trailing = Some(TrailingState::new(100.0));
        store.try_open(p).unwrap();

        store.update_trailing("BTC/USDT", 101.0);
        store.update_trailing("BTC/USDT", 100.5); // adverse move, no effect
        let p = store.get("BTC/USDT").unwrap();
        assert_eq!(p.trailing.unwrap().watermark, 101.0);
    }

    #[test]
    fn concurrent_opens_admit_exactly_the_cap() {
        let store = Arc::new(store(3, 100_000.0));
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                store.try_open(position(&format!("SYM{i}/USDT"), 1000.0)).is_ok()
            }));
        }
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(admitted, 3);
        assert_eq!(store.count(), 3);
    }
}
