//! Orders: intent, side, kind.

use super::ids::OrderId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way an order moves the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1.0 for buys, -1.0 for sells.
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

/// What the strategy means to do with the order.
///
/// Matching only cares about the [`OrderSide`]; the intent is carried through
/// to trades and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    OpenLong,
    CloseLong,
    OpenShort,
    CloseShort,
}

impl Intent {
    pub fn side(self) -> OrderSide {
        match self {
            Intent::OpenLong | Intent::CloseShort => OrderSide::Buy,
            Intent::CloseLong | Intent::OpenShort => OrderSide::Sell,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::OpenLong => "open_long",
            Intent::CloseLong => "close_long",
            Intent::OpenShort => "open_short",
            Intent::CloseShort => "close_short",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pending set an order lives in and how it crosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Fills when price trades through the limit, improved toward the open.
    Limit,
    /// Fills when price trades through the trigger level.
    Stop,
}

/// A pending order. Fills for its full quantity or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub intent: Intent,
    pub kind: OrderKind,
    /// Limit price for limit orders, trigger price for stops.
    pub price: f64,
    /// Unsigned magnitude; direction comes from `intent`.
    pub quantity: f64,
    pub created_at: NaiveDateTime,
}

impl Order {
    pub fn side(&self) -> OrderSide {
        self.intent.side()
    }

    /// Quantity signed by side, as it will appear on the trade.
    pub fn signed_quantity(&self) -> f64 {
        self.side().sign() * self.quantity
    }
}
