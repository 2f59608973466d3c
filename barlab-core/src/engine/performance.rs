//! Performance reconstruction: converts the trade ledger into report rows.
//!
//! Post-processes trades after the replay completes. Pure function:
//! trades + bars + config → one row per trade with running balance.

use crate::domain::{Bar, Intent, OrderId, Trade, TradeId};
use crate::engine::cost_basis::LotLedger;
use crate::engine::state::{ConfigError, EngineConfig};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ReportError {
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),

    #[error("trade {trade_id} at {timestamp} has no matching bar")]
    MissingBar {
        trade_id: TradeId,
        timestamp: NaiveDateTime,
    },
}

/// One trade with its costs and the running account state after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub order_id: OrderId,
    pub trade_id: TradeId,
    pub price: f64,
    pub quantity: f64,
    pub intent: Intent,
    /// Starting cash plus cumulative profit.
    pub balance: f64,
    /// Cumulative realized P&L net of all costs.
    pub profit: f64,
    /// Net position after this trade.
    pub position: f64,
    pub turnover: f64,
    pub slippage: f64,
    pub commission: f64,
    /// Realized P&L contributed by this trade, before costs.
    pub trading_pnl: f64,
}

/// Rebuild per-trade accounting from the ledger.
///
/// `bars` must be sorted by timestamp, as the replay loop requires.
pub fn reconstruct(
    trades: &[Trade],
    bars: &[Bar],
    config: &EngineConfig,
) -> Result<Vec<ReportRow>, ReportError> {
    config.validate()?;

    let mut ledger = LotLedger::new(config.cost_basis);
    let mut rows = Vec::with_capacity(trades.len());
    let mut profit = 0.0;
    let mut position = 0.0;

    for trade in trades {
        let bar = bar_at(bars, trade.timestamp).ok_or(ReportError::MissingBar {
            trade_id: trade.id,
            timestamp: trade.timestamp,
        })?;

        let turnover = (trade.notional() * config.leverage).abs();
        let slippage = turnover * config.slippage_rate;
        let commission = turnover * config.commission_rate;
        let trading_pnl = ledger.apply(trade.quantity, trade.price);

        profit += trading_pnl - commission - slippage;
        position += trade.quantity;

        rows.push(ReportRow {
            timestamp: trade.timestamp,
            symbol: trade.symbol.clone(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            order_id: trade.order_id,
            trade_id: trade.id,
            price: trade.price,
            quantity: trade.quantity,
            intent: trade.intent,
            balance: config.initial_cash + profit,
            profit,
            position,
            turnover,
            slippage,
            commission,
            trading_pnl,
        });
    }

    Ok(rows)
}

fn bar_at(bars: &[Bar], timestamp: NaiveDateTime) -> Option<&Bar> {
    bars.binary_search_by_key(&timestamp, |b| b.timestamp)
        .ok()
        .map(|i| &bars[i])
}
