//! Performance summary: pure functions over the reconstructed report.
//!
//! Every metric is a pure function: report rows and/or the balance series in,
//! scalar out. No dependencies on the loader, sweep, or export layers.

use barlab_core::engine::ReportRow;
use serde::{Deserialize, Serialize};

/// Aggregate statistics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub trade_count: usize,
    /// Trades that reduced or flipped an open position.
    pub closing_trades: usize,
    pub win_rate: f64,
    /// Realized P&L before costs.
    pub gross_pnl: f64,
    pub total_commission: f64,
    pub total_slippage: f64,
    pub total_turnover: f64,
    /// Realized P&L net of all costs.
    pub net_profit: f64,
    pub final_balance: f64,
    pub final_position: f64,
    /// Largest peak-to-trough decline of the balance, as a negative fraction.
    pub max_drawdown: f64,
    pub profit_factor: f64,
}

impl PerformanceSummary {
    /// Compute all statistics from the report rows of one run.
    pub fn compute(rows: &[ReportRow], initial_cash: f64) -> Self {
        let closing = closing_pnls(rows);
        let balances = balance_curve(rows, initial_cash);
        let net_profit = rows.last().map_or(0.0, |r| r.profit);
        Self {
            trade_count: rows.len(),
            closing_trades: closing.len(),
            win_rate: win_rate(&closing),
            gross_pnl: rows.iter().map(|r| r.trading_pnl).sum(),
            total_commission: rows.iter().map(|r| r.commission).sum(),
            total_slippage: rows.iter().map(|r| r.slippage).sum(),
            total_turnover: rows.iter().map(|r| r.turnover).sum(),
            net_profit,
            final_balance: initial_cash + net_profit,
            final_position: rows.last().map_or(0.0, |r| r.position),
            max_drawdown: max_drawdown(&balances),
            profit_factor: profit_factor(&closing),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Realized P&L of each trade that reduced an open position.
///
/// A trade is closing when the position before it was non-zero and the trade
/// moved against its sign. Opening trades realize nothing and are skipped.
pub fn closing_pnls(rows: &[ReportRow]) -> Vec<f64> {
    let mut before = 0.0_f64;
    let mut pnls = Vec::new();
    for row in rows {
        if before != 0.0 && before.signum() != row.quantity.signum() {
            pnls.push(row.trading_pnl);
        }
        before = row.position;
    }
    pnls
}

/// Starting cash followed by the balance after every trade.
pub fn balance_curve(rows: &[ReportRow], initial_cash: f64) -> Vec<f64> {
    std::iter::once(initial_cash)
        .chain(rows.iter().map(|r| r.balance))
        .collect()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if the balance never declines.
pub fn max_drawdown(balances: &[f64]) -> f64 {
    let Some(&first) = balances.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &balance in balances {
        if balance > peak {
            peak = balance;
        }
        if peak > 0.0 {
            let dd = (balance - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Win rate: fraction of closing trades with positive realized P&L.
pub fn win_rate(closing: &[f64]) -> f64 {
    if closing.is_empty() {
        return 0.0;
    }
    let winners = closing.iter().filter(|&&p| p > 0.0).count();
    winners as f64 / closing.len() as f64
}

/// Profit factor: gross profits / gross losses over closing trades.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(closing: &[f64]) -> f64 {
    let gross_profit: f64 = closing.iter().filter(|&&p| p > 0.0).sum();
    let gross_loss: f64 = closing.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}
