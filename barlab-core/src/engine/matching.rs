//! Matching engine: crosses pending orders against each new bar.
//!
//! Two passes per bar over the same bar snapshot, limit orders first, then
//! stops. Every pending order is checked exactly once per pass; orders that
//! do not cross stay in their set in their original order.
//!
//! Limit pass: buys cross at `low`, sells at `high`, and fill at the limit
//! improved toward the open. Stop pass: buys trigger at `high`, sells at
//! `low`, and fill at the trigger price clamped to that extreme.

use crate::domain::{Bar, IdGen, Order, OrderSide, Trade};
use crate::engine::order_book::OrderBook;

/// Fill price of a limit order on this bar, or `None` if it does not cross.
pub fn limit_fill_price(order: &Order, bar: &Bar) -> Option<f64> {
    match order.side() {
        OrderSide::Buy => {
            let long_cross = bar.low;
            (long_cross > 0.0 && order.price >= long_cross).then(|| order.price.min(bar.open))
        }
        OrderSide::Sell => {
            let short_cross = bar.high;
            (short_cross > 0.0 && order.price <= short_cross).then(|| order.price.max(bar.open))
        }
    }
}

/// Fill price of a stop order on this bar, or `None` if it does not trigger.
pub fn stop_fill_price(order: &Order, bar: &Bar) -> Option<f64> {
    match order.side() {
        OrderSide::Buy => {
            let long_cross = bar.high;
            (long_cross > 0.0 && order.price <= long_cross).then(|| order.price.min(long_cross))
        }
        OrderSide::Sell => {
            let short_cross = bar.low;
            (short_cross > 0.0 && order.price >= short_cross).then(|| order.price.max(short_cross))
        }
    }
}

/// Owns the net position and the append-only trade ledger.
#[derive(Debug, Clone, Default)]
pub struct MatchingEngine {
    position: f64,
    trades: Vec<Trade>,
    trade_ids: IdGen,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Net signed position. Always equals the sum of recorded trade quantities.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Every trade recorded so far, in execution order.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    /// Match both pending sets against `bar`.
    ///
    /// Returns the trades produced on this bar (also appended to the ledger).
    pub fn match_bar(&mut self, bar: &Bar, book: &mut OrderBook) -> &[Trade] {
        let start = self.trades.len();
        self.cross(bar, &mut book.active, limit_fill_price);
        self.cross(bar, &mut book.stops, stop_fill_price);
        &self.trades[start..]
    }

    fn cross(
        &mut self,
        bar: &Bar,
        orders: &mut Vec<Order>,
        fill_price: fn(&Order, &Bar) -> Option<f64>,
    ) {
        let pending = std::mem::take(orders);
        for order in pending {
            match fill_price(&order, bar) {
                Some(price) => self.fill(order, price, bar),
                None => orders.push(order),
            }
        }
    }

    fn fill(&mut self, order: Order, price: f64, bar: &Bar) {
        let quantity = order.signed_quantity();
        self.position += quantity;

        let trade = Trade {
            id: self.trade_ids.next_id(),
            order_id: order.id,
            symbol: order.symbol,
            intent: order.intent,
            price,
            quantity,
            timestamp: bar.timestamp,
        };
        tracing::debug!(
            trade_id = %trade.id,
            order_id = %trade.order_id,
            intent = %trade.intent,
            price,
            quantity,
            position = self.position,
            "order filled"
        );
        self.trades.push(trade);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Intent, OrderKind};
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, m, 0)
            .unwrap()
    }

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(ts(1), open, high, low, close, 1.0)
    }

    fn order(intent: Intent, kind: OrderKind, price: f64) -> Order {
        Order {
            id: crate::domain::OrderId(1),
            symbol: "BTCUSDT".into(),
            intent,
            kind,
            price,
            quantity: 1.0,
            created_at: ts(0),
        }
    }

    #[test]
    fn buy_limit_fills_at_open_when_open_is_better() {
        let o = order(Intent::OpenLong, OrderKind::Limit, 100.0);
        assert_eq!(limit_fill_price(&o, &bar(98.0, 101.0, 97.0, 99.0)), Some(98.0));
    }

    #[test]
    fn buy_limit_fills_at_limit_when_price_trades_down_to_it() {
        let o = order(Intent::CloseShort, OrderKind::Limit, 100.0);
        assert_eq!(limit_fill_price(&o, &bar(102.0, 103.0, 99.5, 101.0)), Some(100.0));
    }

    #[test]
    fn buy_limit_above_the_low_never_fills() {
        let o = order(Intent::OpenLong, OrderKind::Limit, 100.0);
        assert_eq!(limit_fill_price(&o, &bar(102.0, 103.0, 100.5, 101.0)), None);
    }

    #[test]
    fn sell_limit_improves_toward_open() {
        let o = order(Intent::OpenShort, OrderKind::Limit, 100.0);
        assert_eq!(limit_fill_price(&o, &bar(101.0, 102.0, 99.0, 100.0)), Some(101.0));
        let o = order(Intent::CloseLong, OrderKind::Limit, 100.0);
        assert_eq!(limit_fill_price(&o, &bar(98.0, 100.5, 97.0, 100.0)), Some(100.0));
        assert_eq!(limit_fill_price(&o, &bar(98.0, 99.5, 97.0, 99.0)), None);
    }

    #[test]
    fn zero_prices_never_cross() {
        let buy = order(Intent::OpenLong, OrderKind::Limit, 100.0);
        assert_eq!(limit_fill_price(&buy, &bar(0.0, 0.0, 0.0, 0.0)), None);
        let sell = order(Intent::OpenShort, OrderKind::Stop, 100.0);
        assert_eq!(stop_fill_price(&sell, &bar(0.0, 0.0, 0.0, 0.0)), None);
    }

    #[test]
    fn stops_trigger_through_the_extremes() {
        let buy_stop = order(Intent::OpenLong, OrderKind::Stop, 105.0);
        assert_eq!(stop_fill_price(&buy_stop, &bar(100.0, 106.0, 99.0, 104.0)), Some(105.0));
        assert_eq!(stop_fill_price(&buy_stop, &bar(100.0, 104.0, 99.0, 104.0)), None);

        let sell_stop = order(Intent::CloseLong, OrderKind::Stop, 95.0);
        assert_eq!(stop_fill_price(&sell_stop, &bar(100.0, 101.0, 94.0, 96.0)), Some(95.0));
        assert_eq!(stop_fill_price(&sell_stop, &bar(100.0, 101.0, 95.5, 96.0)), None);
    }

    #[test]
    fn match_bar_fills_adjacent_orders_and_keeps_the_rest_in_order() {
        let mut book = OrderBook::new("BTCUSDT");
        let mut engine = MatchingEngine::new();
        // Two adjacent crossing orders followed by a resting one.
        book.place(Intent::OpenLong, OrderKind::Limit, 100.0, 1.0, ts(0)).unwrap();
        book.place(Intent::OpenLong, OrderKind::Limit, 99.0, 2.0, ts(0)).unwrap();
        book.place(Intent::OpenLong, OrderKind::Limit, 90.0, 4.0, ts(0)).unwrap();
        book.place(Intent::OpenLong, OrderKind::Limit, 80.0, 8.0, ts(0)).unwrap();

        let filled = engine.match_bar(&bar(99.5, 101.0, 98.5, 100.0), &mut book);
        assert_eq!(filled.len(), 2);
        assert_eq!(filled[0].price, 99.5);
        assert_eq!(filled[1].price, 99.0);
        assert_eq!(engine.position(), 3.0);

        let remaining: Vec<f64> = book.active().iter().map(|o| o.price).collect();
        assert_eq!(remaining, vec![90.0, 80.0]);
    }

    #[test]
    fn position_tracks_signed_trade_quantities() {
        let mut book = OrderBook::new("BTCUSDT");
        let mut engine = MatchingEngine::new();
        book.place(Intent::OpenShort, OrderKind::Limit, 100.0, 3.0, ts(0)).unwrap();
        book.place(Intent::CloseShort, OrderKind::Stop, 100.5, 1.0, ts(0)).unwrap();

        let trades = engine.match_bar(&bar(100.0, 101.0, 99.0, 100.0), &mut book).to_vec();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].quantity, -3.0);
        assert_eq!(trades[1].quantity, 1.0);
        assert_eq!(engine.position(), -2.0);
        let sum: f64 = engine.trades().iter().map(|t| t.quantity).sum();
        assert_eq!(sum, engine.position());
        assert!(book.is_empty());
    }
}
