//! TTL signal cache keyed by (symbol, level).
//!
//! Lookup treats an expired entry as absent and removes it on the spot, so
//! the map never serves stale signals and never needs a sweeper task. Time
//! comes from the injected clock, which keeps replay deterministic.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::clock::Clock;
use crate::domain::{Level, Signal};

#[derive(Debug, Clone)]
struct CachedSignal {
    signal: Signal,
}

/// Concurrent signal cache with lazy expiry.
pub struct SignalCache {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<(String, Level), CachedSignal>>,
}

impl SignalCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a live signal; expired entries are evicted and reported absent.
    pub fn get(&self, symbol: &str, level: Level) -> Option<Signal> {
        let now = self.clock.now();
        let key = (symbol.to_string(), level);
        {
            let entries = self.entries.read();
            match entries.get(&key) {
                Some(cached) if cached.signal.is_valid(now) => {
                    return Some(cached.signal.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: take the write lock and re-check before evicting, another
        // writer may have refreshed the entry in between.
        let mut entries = self.entries.write();
        match entries.get(&key) {
            Some(cached) if cached.signal.is_valid(now) => Some(cached.signal.clone()),
            Some(_) => {
                entries.remove(&key);
                debug!(symbol, level = ?level, "evicted expired signal");
                None
            }
            None => None,
        }
    }

    pub fn put(&self, symbol: &str, level: Level, signal: Signal) {
        self.entries
            .write()
            .insert((symbol.to_string(), level), CachedSignal { signal });
    }

    pub fn invalidate(&self, symbol: &str, level: Level) {
        self.entries
            .write()
            .remove(&(symbol.to_string(), level));
    }

    /// Drop every cached signal at one level, across all symbols.
    pub fn invalidate_level(&self, level: Level) {
        let mut entries = self.entries.write();
        entries.retain(|(_, l), _| *l != level);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimClock;
    use crate::domain::{Direction, Verdict};
    use chrono::{Duration, TimeZone, Utc};

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn signal(level: Level, at: chrono::DateTime<Utc>) -> Signal {
        Signal::new(
            Direction::Long,
            0.8,
            0.7,
            level,
            Verdict::Pass,
            at,
            level.default_ttl(),
            "test",
        )
    }

    #[test]
    fn hit_within_ttl() {
        let clock = SimClock::shared(start());
        let cache = SignalCache::new(clock.clone());
        cache.put("BTC/USDT", Level::Tactical, signal(Level::Tactical, start()));

        clock.advance(Duration::seconds(9));
        let hit = cache.get("BTC/USDT", Level::Tactical).unwrap();
        assert_eq!(hit.direction, Direction::Long);
    }

    #[test]
    fn expired_entry_is_absent_and_evicted() {
        let clock = SimClock::shared(start());
        let cache = SignalCache::new(clock.clone());
        cache.put("BTC/USDT", Level::Tactical, signal(Level::Tactical, start()));

        clock.advance(Duration::seconds(10));
        assert!(cache.get("BTC/USDT", Level::Tactical).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn levels_are_independent_keys() {
        let clock = SimClock::shared(start());
        let cache = SignalCache::new(clock.clone());
        cache.put("BTC/USDT", Level::Macro, signal(Level::Macro, start()));
        cache.put("BTC/USDT", Level::Tactical, signal(Level::Tactical, start()));

        // Tactical (10s TTL) lapses while Macro (60s) survives
        clock.advance(Duration::seconds(30));
        assert!(cache.get("BTC/USDT", Level::Macro).is_some());
        assert!(cache.get("BTC/USDT", Level::Tactical).is_none());
    }

    #[test]
    fn invalidate_removes_single_key() {
        let clock = SimClock::shared(start());
        let cache = SignalCache::new(clock);
        cache.put("BTC/USDT", Level::Macro, signal(Level::Macro, start()));
        cache.put("ETH/USDT", Level::Macro, signal(Level::Macro, start()));

        cache.invalidate("BTC/USDT", Level::Macro);
        assert!(cache.get("BTC/USDT", Level::Macro).is_none());
        assert!(cache.get("ETH/USDT", Level::Macro).is_some());
    }

    #[test]
    fn invalidate_level_spans_symbols() {
        let clock = SimClock::shared(start());
        let cache = SignalCache::new(clock);
        cache.put("BTC/USDT", Level::Macro, signal(Level::Macro, start()));
        cache.put("ETH/USDT", Level::Macro, signal(Level::Macro, start()));
        cache.put("BTC/USDT", Level::Strategic, signal(Level::Strategic, start()));

        cache.invalidate_level(Level::Macro);
        assert!(cache.get("BTC/USDT", Level::Macro).is_none());
        assert!(cache.get("ETH/USDT", Level::Macro).is_none());
        assert!(cache.get("BTC/USDT", Level::Strategic).is_some());
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let clock = SimClock::shared(start());
        let cache = SignalCache::new(clock);
        cache.put("BTC/USDT", Level::Strategic, signal(Level::Strategic, start()));
        let mut replacement = signal(Level::Strategic, start());
        replacement.direction = Direction::Short;
        cache.put("BTC/USDT", Level::Strategic, replacement);

        let hit = cache.get("BTC/USDT", Level::Strategic).unwrap();
        assert_eq!(hit.direction, Direction::Short);
        assert_eq!(cache.len(), 1);
    }
}
