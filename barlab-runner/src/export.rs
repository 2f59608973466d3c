//! Reporting and export: CSV and JSON artifact generation.
//!
//! Artifacts for a single run:
//! - `report.csv`: one row per trade with costs and running balance
//! - `trades.csv`: the raw trade ledger
//! - `records.csv`: strategy-recorded series, one column per series
//! - `summary.json`: run metadata and the performance summary
//!
//! Persisted JSON carries a `schema_version`. Unknown versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use barlab_core::domain::Trade;
use barlab_core::engine::{EngineConfig, ReportRow};
use barlab_core::strategy::{Params, RecordTable};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::metrics::PerformanceSummary;
use crate::runner::{BacktestReport, SCHEMA_VERSION};
use crate::sweep::SweepResults;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a full `BacktestReport` to pretty JSON.
pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a `BacktestReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

#[derive(Serialize)]
struct SummaryManifest<'a> {
    schema_version: u32,
    strategy: &'a str,
    params: &'a Params,
    engine: &'a EngineConfig,
    dataset_hash: &'a str,
    fingerprint: &'a str,
    bar_count: usize,
    orders_placed: u64,
    open_orders: usize,
    summary: &'a PerformanceSummary,
}

/// Run metadata and summary statistics, without the per-trade rows.
pub fn export_summary_json(report: &BacktestReport) -> Result<String> {
    let manifest = SummaryManifest {
        schema_version: report.schema_version,
        strategy: &report.strategy,
        params: &report.params,
        engine: &report.engine,
        dataset_hash: &report.dataset_hash,
        fingerprint: &report.fingerprint,
        bar_count: report.result.bar_count,
        orders_placed: report.result.orders_placed,
        open_orders: report.result.open_orders,
        summary: &report.summary,
    };
    serde_json::to_string_pretty(&manifest).context("failed to serialize run summary")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the per-trade report.
///
/// Columns: datetime, symbol, open, high, low, close, order_id, trade_id,
/// price, quantity, intent, balance, profit, position, turnover, slippage,
/// commission, trading_pnl
pub fn export_report_csv(rows: &[ReportRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "datetime",
        "symbol",
        "open",
        "high",
        "low",
        "close",
        "order_id",
        "trade_id",
        "price",
        "quantity",
        "intent",
        "balance",
        "profit",
        "position",
        "turnover",
        "slippage",
        "commission",
        "trading_pnl",
    ])?;

    for r in rows {
        wtr.write_record([
            &r.timestamp.format(TIME_FORMAT).to_string(),
            &r.symbol,
            &r.open.to_string(),
            &r.high.to_string(),
            &r.low.to_string(),
            &r.close.to_string(),
            &r.order_id.to_string(),
            &r.trade_id.to_string(),
            &format!("{:.6}", r.price),
            &format!("{:.6}", r.quantity),
            r.intent.as_str(),
            &format!("{:.2}", r.balance),
            &format!("{:.2}", r.profit),
            &format!("{:.6}", r.position),
            &format!("{:.2}", r.turnover),
            &format!("{:.4}", r.slippage),
            &format!("{:.4}", r.commission),
            &format!("{:.4}", r.trading_pnl),
        ])?;
    }

    finish(wtr)
}

/// Export the raw trade ledger.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "trade_id", "order_id", "datetime", "symbol", "intent", "price", "quantity",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.id.to_string(),
            &t.order_id.to_string(),
            &t.timestamp.format(TIME_FORMAT).to_string(),
            &t.symbol,
            t.intent.as_str(),
            &format!("{:.6}", t.price),
            &format!("{:.6}", t.quantity),
        ])?;
    }
    finish(wtr)
}

/// Export recorded series as a wide table; missing cells are empty.
pub fn export_records_csv(records: &RecordTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["datetime".to_string()];
    header.extend(records.names().map(str::to_string));
    wtr.write_record(&header)?;

    for (ts, cells) in records.rows() {
        let mut record = vec![ts.format(TIME_FORMAT).to_string()];
        record.extend(cells.iter().map(|c| c.map(|v| v.to_string()).unwrap_or_default()));
        wtr.write_record(&record)?;
    }
    finish(wtr)
}

/// Export sweep results, one row per parameter set in grid order.
pub fn export_sweep_csv(results: &SweepResults) -> Result<String> {
    let names: BTreeSet<&str> = results
        .all()
        .iter()
        .flat_map(|e| e.params.keys().map(String::as_str))
        .collect();

    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header: Vec<&str> = names.iter().copied().collect();
    header.extend([
        "trades",
        "win_rate",
        "net_profit",
        "final_balance",
        "max_drawdown",
        "profit_factor",
        "fingerprint",
    ]);
    wtr.write_record(&header)?;

    for entry in results.all() {
        let s = &entry.summary;
        let mut record: Vec<String> = names
            .iter()
            .map(|n| entry.params.get(*n).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        record.extend([
            s.trade_count.to_string(),
            format!("{:.4}", s.win_rate),
            format!("{:.2}", s.net_profit),
            format!("{:.2}", s.final_balance),
            format!("{:.4}", s.max_drawdown),
            format!("{:.2}", s.profit_factor),
            entry.fingerprint.clone(),
        ]);
        wtr.write_record(&record)?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Paths of the files written by [`save_artifacts`].
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub report_csv: PathBuf,
    pub trades_csv: PathBuf,
    pub records_csv: PathBuf,
    pub summary_json: PathBuf,
}

/// Save the full artifact set for a single backtest run into `output_dir`.
///
/// The directory is created if missing; existing files are overwritten.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<ArtifactPaths> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create artifact dir: {}", output_dir.display()))?;

    let paths = ArtifactPaths {
        dir: output_dir.to_path_buf(),
        report_csv: output_dir.join("report.csv"),
        trades_csv: output_dir.join("trades.csv"),
        records_csv: output_dir.join("records.csv"),
        summary_json: output_dir.join("summary.json"),
    };

    write(&paths.report_csv, &export_report_csv(&report.rows)?)?;
    write(&paths.trades_csv, &export_trades_csv(&report.result.trades)?)?;
    write(&paths.records_csv, &export_records_csv(&report.result.records)?)?;
    write(&paths.summary_json, &export_summary_json(report)?)?;

    tracing::info!(dir = %output_dir.display(), "artifacts saved");
    Ok(paths)
}

/// Save sweep results as `sweep.csv` under `output_dir`.
pub fn save_sweep(results: &SweepResults, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create artifact dir: {}", output_dir.display()))?;
    let path = output_dir.join("sweep.csv");
    write(&path, &export_sweep_csv(results)?)?;
    Ok(path)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
