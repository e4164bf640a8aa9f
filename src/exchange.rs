//! Exchange adapter boundary.
//!
//! The core only ever sees this trait; live connectors own retry/backoff and
//! rate limiting behind it. Any error is treated as "no fill" upstream, the
//! core never infers partial state from a failed call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MarketSnapshot, Side};

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("symbol not available: {0}")]
    UnknownSymbol(String),
    #[error("order rejected: {0}")]
    OrderRejected(String),
    #[error("order not found: {0}")]
    UnknownOrder(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Confirmed execution of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFill {
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub fee: f64,
    pub filled_at: DateTime<Utc>,
}

/// Minimal surface the decision core needs from an exchange.
pub trait ExchangeAdapter: Send + Sync {
    fn get_orderbook(&self, symbol: &str) -> Result<MarketSnapshot, AdapterError>;

    /// Submit a taker order for `quantity` base units. Returns the fill or an
    /// error; there is no partially-known state.
    fn place_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
    ) -> Result<OrderFill, AdapterError>;

    fn cancel_order(&self, order_id: &str) -> Result<(), AdapterError>;
}
