//! Strategy context: the strategy's window onto the engine for one bar.

use super::records::RecordTable;
use crate::domain::{Intent, Order, OrderId, OrderKind};
use crate::engine::order_book::{OrderBook, OrderBookError};
use chrono::NaiveDateTime;

/// Order entry, cancellation, and read-only position for the current bar.
///
/// Calls only queue or clear orders; fills happen on later bars.
pub struct StrategyContext<'a> {
    timestamp: NaiveDateTime,
    position: f64,
    book: &'a mut OrderBook,
    records: &'a mut RecordTable,
}

impl<'a> StrategyContext<'a> {
    pub fn new(
        timestamp: NaiveDateTime,
        position: f64,
        book: &'a mut OrderBook,
        records: &'a mut RecordTable,
    ) -> Self {
        Self {
            timestamp,
            position,
            book,
            records,
        }
    }

    /// Net position after this bar's fills.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Timestamp of the bar being handled.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn symbol(&self) -> &str {
        self.book.symbol()
    }

    /// Limit buy that opens or adds to a long.
    pub fn buy(&mut self, price: f64, quantity: f64) -> Result<OrderId, OrderBookError> {
        self.limit(Intent::OpenLong, price, quantity)
    }

    /// Limit sell that closes a long.
    pub fn sell(&mut self, price: f64, quantity: f64) -> Result<OrderId, OrderBookError> {
        self.limit(Intent::CloseLong, price, quantity)
    }

    /// Limit sell that opens or adds to a short.
    pub fn short(&mut self, price: f64, quantity: f64) -> Result<OrderId, OrderBookError> {
        self.limit(Intent::OpenShort, price, quantity)
    }

    /// Limit buy that closes a short.
    pub fn cover(&mut self, price: f64, quantity: f64) -> Result<OrderId, OrderBookError> {
        self.limit(Intent::CloseShort, price, quantity)
    }

    /// Stop order with an explicit intent, typically a protective exit.
    pub fn stop(
        &mut self,
        price: f64,
        quantity: f64,
        intent: Intent,
    ) -> Result<OrderId, OrderBookError> {
        self.book
            .place(intent, OrderKind::Stop, price, quantity, self.timestamp)
    }

    pub fn cancel_all(&mut self) -> usize {
        self.book.cancel_all()
    }

    pub fn cancel_active(&mut self) -> usize {
        self.book.cancel_active()
    }

    pub fn cancel_stops(&mut self) -> usize {
        self.book.cancel_stops()
    }

    /// Pending limit orders.
    pub fn active_orders(&self) -> &[Order] {
        self.book.active()
    }

    /// Pending stop orders.
    pub fn stop_orders(&self) -> &[Order] {
        self.book.stops()
    }

    /// Record an auxiliary value for this bar.
    pub fn record(&mut self, name: &str, value: f64) {
        self.records.record(name, self.timestamp, value);
    }

    fn limit(
        &mut self,
        intent: Intent,
        price: f64,
        quantity: f64,
    ) -> Result<OrderId, OrderBookError> {
        self.book
            .place(intent, OrderKind::Limit, price, quantity, self.timestamp)
    }
}
