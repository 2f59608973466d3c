//! Domain types for BarLab

pub mod bar;
pub mod ids;
pub mod order;
pub mod trade;

pub use bar::{Bar, BarError};
pub use ids::{IdGen, OrderId, TradeId};
pub use order::{Intent, Order, OrderKind, OrderSide};
pub use trade::Trade;
