//! Replay tick records and the JSONL reader.
//!
//! The record format mirrors what the data collector appends: one JSON object
//! per line with timestamp, symbol, book levels, and last trade. The replay
//! engine only ever reads this format.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{BookLevel, MarketSnapshot};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("io error in tick stream: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tick at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("tick stream out of order: {current} after {previous}")]
    OutOfOrder {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
    #[error("failed to serialize trade log: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}

/// One recorded market observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub last_price: f64,
    pub last_size: f64,
}

impl TickRecord {
    pub fn into_snapshot(self) -> MarketSnapshot {
        MarketSnapshot {
            symbol: self.symbol,
            timestamp: self.timestamp,
            bids: self.bids,
            asks: self.asks,
            last_price: self.last_price,
            last_size: self.last_size,
        }
    }
}

/// Line-by-line JSONL tick reader. Blank lines are skipped.
pub struct JsonlTickSource<R> {
    reader: R,
    line: usize,
}

impl JsonlTickSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonlTickSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: 0 }
    }
}

impl<R: BufRead> Iterator for JsonlTickSource<R> {
    type Item = Result<TickRecord, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut buf = String::new();
            self.line += 1;
            match self.reader.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = buf.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(trimmed).map_err(|source| {
                        ReplayError::Parse {
                            line: self.line,
                            source,
                        }
                    }));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
