//! Trade: one fill of one order.

use super::ids::{OrderId, TradeId};
use super::order::{Intent, OrderSide};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An executed fill. Append-only once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub order_id: OrderId,
    pub symbol: String,
    pub intent: Intent,
    pub price: f64,
    /// Positive for buys, negative for sells. The position moves by exactly
    /// this amount.
    pub quantity: f64,
    pub timestamp: NaiveDateTime,
}

impl Trade {
    pub fn side(&self) -> OrderSide {
        self.intent.side()
    }

    /// Unlevered notional of the fill.
    pub fn notional(&self) -> f64 {
        (self.quantity * self.price).abs()
    }
}
