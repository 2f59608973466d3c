//! Integration tests for the replay loop, matching, and reporting together.
//!
//! Tests:
//! 1. Order timing: orders placed on bar N match from bar N+1
//! 2. Cancels between bars leave nothing to match
//! 3. Position == sum of trade quantities
//! 4. Determinism: identical inputs give identical ledgers and reports

use barlab_core::domain::{Bar, Intent};
use barlab_core::engine::{reconstruct, run_backtest, EngineConfig, EngineError};
use barlab_core::strategy::examples::{ChannelBreakout, Scripted, ScriptedAction};
use chrono::{Duration, NaiveDate, NaiveDateTime};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Helper: minute bars from (open, high, low, close) tuples.
fn bars(ohlc: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    ohlc.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Bar::new(start() + Duration::minutes(i as i64), o, h, l, c, 10.0))
        .collect()
}

/// Helper: N minute bars oscillating around 100.
fn wave(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let mid = 100.0 + (i as f64 * 0.3).sin() * 8.0;
            Bar::new(
                start() + Duration::minutes(i as i64),
                mid - 0.2,
                mid + 1.5,
                mid - 1.5,
                mid + 0.2,
                5.0,
            )
        })
        .collect()
}

// ──────────────────────────────────────────────
// Order timing and cancellation
// ──────────────────────────────────────────────

#[test]
fn buy_limit_fills_next_bar_never_worse_than_limit() {
    let feed = bars(&[
        (100.0, 101.0, 99.0, 100.0),
        (98.0, 99.0, 97.0, 98.5),
    ]);
    let mut strategy = Scripted::new().at(0, ScriptedAction::Buy { price: 99.0, quantity: 2.0 });
    let result = run_backtest(&feed, &EngineConfig::default(), &mut strategy).unwrap();

    assert_eq!(result.trades.len(), 1);
    let fill = &result.trades[0];
    assert_eq!(fill.price, 98.0, "improved to the open");
    assert!(fill.price <= 99.0);
    assert_eq!(fill.quantity, 2.0);
    assert_eq!(fill.timestamp, feed[1].timestamp);
}

#[test]
fn cancel_all_between_bars_leaves_nothing_to_match() {
    let feed = bars(&[
        (100.0, 101.0, 99.0, 100.0),
        (100.0, 101.0, 99.0, 100.0),
        (100.0, 150.0, 50.0, 100.0),
    ]);
    let mut strategy = Scripted::new()
        .at(0, ScriptedAction::Buy { price: 60.0, quantity: 1.0 })
        .at(0, ScriptedAction::Stop { price: 140.0, quantity: 1.0, intent: Intent::OpenLong })
        .at(1, ScriptedAction::CancelAll);
    let result = run_backtest(&feed, &EngineConfig::default(), &mut strategy).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.open_orders, 0);
    assert_eq!(result.orders_placed, 2);
}

#[test]
fn cancel_stops_keeps_limits() {
    let feed = bars(&[
        (100.0, 101.0, 99.0, 100.0),
        (100.0, 101.0, 99.0, 100.0),
        (100.0, 150.0, 50.0, 100.0),
    ]);
    let mut strategy = Scripted::new()
        .at(0, ScriptedAction::Buy { price: 60.0, quantity: 1.0 })
        .at(0, ScriptedAction::Stop { price: 140.0, quantity: 1.0, intent: Intent::OpenLong })
        .at(1, ScriptedAction::CancelStops);
    let result = run_backtest(&feed, &EngineConfig::default(), &mut strategy).unwrap();

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].price, 60.0);
}

#[test]
fn unfilled_orders_persist_without_error() {
    let feed = wave(30);
    let mut strategy = Scripted::new().at(0, ScriptedAction::Buy { price: 1.0, quantity: 1.0 });
    let result = run_backtest(&feed, &EngineConfig::default(), &mut strategy).unwrap();
    assert!(result.trades.is_empty());
    assert_eq!(result.open_orders, 1);
}

#[test]
fn protective_stop_closes_long() {
    let feed = bars(&[
        (100.0, 101.0, 99.0, 100.0),
        (100.0, 101.0, 99.5, 100.5),
        (100.5, 100.8, 94.0, 95.0),
    ]);
    let mut strategy = Scripted::new()
        .at(0, ScriptedAction::Buy { price: 100.0, quantity: 3.0 })
        .at(1, ScriptedAction::Stop { price: 96.0, quantity: 3.0, intent: Intent::CloseLong });
    let result = run_backtest(&feed, &EngineConfig::default(), &mut strategy).unwrap();

    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[1].price, 96.0, "max(stop, low)");
    assert_eq!(result.final_position, 0.0);
    assert_eq!(strategy.observed_positions(), &[0.0, 3.0, 0.0]);
}

// ──────────────────────────────────────────────
// Failure modes
// ──────────────────────────────────────────────

#[test]
fn rejected_bar_keeps_prior_ledger() {
    let mut feed = bars(&[
        (100.0, 101.0, 99.0, 100.0),
        (100.0, 101.0, 99.0, 100.0),
        (100.0, 101.0, 99.0, 100.0),
    ]);
    feed[2].low = f64::NAN;
    let mut strategy = Scripted::new().at(0, ScriptedAction::Buy { price: 100.0, quantity: 1.0 });
    let err = run_backtest(&feed, &EngineConfig::default(), &mut strategy).unwrap_err();
    assert!(matches!(err, EngineError::InvalidBar { index: 2, .. }));
    assert_eq!(strategy.observed_positions(), &[0.0, 1.0]);
}

#[test]
fn refused_order_aborts_with_strategy_error() {
    let feed = bars(&[(100.0, 101.0, 99.0, 100.0)]);
    let mut strategy = Scripted::new().at(0, ScriptedAction::Sell { price: 100.0, quantity: -1.0 });
    let err = run_backtest(&feed, &EngineConfig::default(), &mut strategy).unwrap_err();
    assert!(matches!(err, EngineError::Strategy { index: 0, .. }));
}

// ──────────────────────────────────────────────
// Ledger invariants and determinism
// ──────────────────────────────────────────────

#[test]
fn breakout_position_matches_ledger() {
    let feed = wave(600);
    let mut strategy = ChannelBreakout::new(15, 1.0).unwrap();
    let result = run_backtest(&feed, &EngineConfig::default(), &mut strategy).unwrap();

    assert!(!result.trades.is_empty(), "breakout should trade on a wave");
    let sum: f64 = result.trades.iter().map(|t| t.quantity).sum();
    assert!((sum - result.final_position).abs() < 1e-9);
    assert_eq!(strategy.windows(), 40);
    assert!(result.records.series("channel_high").is_some());

    let rows = reconstruct(&result.trades, &feed, &EngineConfig::default()).unwrap();
    assert_eq!(rows.len(), result.trades.len());
    assert!((rows.last().unwrap().position - result.final_position).abs() < 1e-9);
}

#[test]
fn replay_is_deterministic() {
    let feed = wave(400);
    let config = EngineConfig::default();

    let run = || {
        let mut strategy = ChannelBreakout::new(10, 2.0).unwrap();
        let result = run_backtest(&feed, &config, &mut strategy).unwrap();
        let rows = reconstruct(&result.trades, &feed, &config).unwrap();
        (
            serde_json::to_string(&result.trades).unwrap(),
            serde_json::to_string(&rows).unwrap(),
        )
    };

    assert_eq!(run(), run());
}

#[test]
fn open_close_round_trip_report() {
    let feed = bars(&[
        (100.0, 101.0, 99.0, 100.0),
        (100.0, 101.0, 99.0, 100.0),
        (100.0, 111.0, 100.0, 110.0),
        (110.0, 111.0, 109.0, 110.0),
    ]);
    let mut strategy = Scripted::new()
        .at(0, ScriptedAction::Buy { price: 100.0, quantity: 10.0 })
        .at(2, ScriptedAction::Sell { price: 110.0, quantity: 10.0 });
    let config = EngineConfig {
        commission_rate: 0.001,
        slippage_rate: 0.0,
        ..EngineConfig::default()
    };
    let result = run_backtest(&feed, &config, &mut strategy).unwrap();
    let rows = reconstruct(&result.trades, &feed, &config).unwrap();

    assert_eq!(rows.len(), 2);
    assert!((rows[1].trading_pnl - 100.0).abs() < 1e-9);
    let commissions = rows[0].commission + rows[1].commission;
    assert!((rows[1].profit - (100.0 - commissions)).abs() < 1e-9);
    assert!((rows[1].balance - (config.initial_cash + rows[1].profit)).abs() < 1e-6);
}
