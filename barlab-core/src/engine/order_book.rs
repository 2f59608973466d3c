//! Order book: the two pending-order sets and order entry.
//!
//! Limit orders live in the active set, stop orders in the stop set. Both are
//! insertion-ordered and scanned in full by the matching engine on every bar.
//! An order leaves its set exactly once: when it fills or when it is cancelled.
//!
//! The order book does NOT decide fills; that is the matching engine's job.

use crate::domain::{IdGen, Intent, Order, OrderId, OrderKind};
use chrono::NaiveDateTime;
use thiserror::Error;

/// Reasons an order is refused at entry. A refused order is never queued.
#[derive(Debug, Error, PartialEq)]
pub enum OrderBookError {
    #[error("order quantity must be positive and finite, got {0}")]
    InvalidQuantity(f64),

    #[error("order price must be finite, got {0}")]
    InvalidPrice(f64),
}

/// Pending limit and stop orders for a single instrument.
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: String,
    ids: IdGen,
    pub(crate) active: Vec<Order>,
    pub(crate) stops: Vec<Order>,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ids: IdGen::new(),
            active: Vec::new(),
            stops: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Create an order and queue it in the set matching its kind.
    pub fn place(
        &mut self,
        intent: Intent,
        kind: OrderKind,
        price: f64,
        quantity: f64,
        created_at: NaiveDateTime,
    ) -> Result<OrderId, OrderBookError> {
        if !price.is_finite() {
            return Err(OrderBookError::InvalidPrice(price));
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(OrderBookError::InvalidQuantity(quantity));
        }

        let order = Order {
            id: self.ids.next_id(),
            symbol: self.symbol.clone(),
            intent,
            kind,
            price,
            quantity,
            created_at,
        };
        let id = order.id;
        tracing::debug!(%id, %intent, ?kind, price, quantity, %created_at, "order placed");

        match kind {
            OrderKind::Limit => self.active.push(order),
            OrderKind::Stop => self.stops.push(order),
        }
        Ok(id)
    }

    /// Pending limit orders in submission order.
    pub fn active(&self) -> &[Order] {
        &self.active
    }

    /// Pending stop orders in submission order.
    pub fn stops(&self) -> &[Order] {
        &self.stops
    }

    /// Look up a pending order by ID.
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.active
            .iter()
            .chain(self.stops.iter())
            .find(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.stops.is_empty()
    }

    /// Clear both sets. Returns the number of orders removed.
    pub fn cancel_all(&mut self) -> usize {
        self.cancel_active() + self.cancel_stops()
    }

    /// Clear the limit set. Returns the number of orders removed.
    pub fn cancel_active(&mut self) -> usize {
        let n = self.active.len();
        self.active.clear();
        n
    }

    /// Clear the stop set. Returns the number of orders removed.
    pub fn cancel_stops(&mut self) -> usize {
        let n = self.stops.len();
        self.stops.clear();
        n
    }

    /// Total orders ever accepted by this book.
    pub fn orders_placed(&self) -> u64 {
        self.ids.issued()
    }
}
