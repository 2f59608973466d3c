//! BarLab CLI: run, sweep, and synthetic-data commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file
//! - `sweep`: run the config's `[sweep]` grid and rank the results
//! - `synth`: write a seeded synthetic minute-bar CSV

use anyhow::{bail, Context, Result};
use barlab_runner::data_loader::write_csv;
use barlab_runner::{
    load_csv, registry_sweep, run_from_config, save_artifacts, save_sweep,
    synthetic_minute_bars, BacktestConfig, BacktestReport, ParamGrid, SweepResults,
};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "barlab", about = "BarLab CLI: bar-replay backtesting engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Override the CSV bar file named in the config.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Output directory for report and summary artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run the parameter grid from the config's [sweep] table.
    Sweep {
        /// Path to a TOML config file with a [sweep] table.
        #[arg(long)]
        config: PathBuf,

        /// Override the CSV bar file named in the config.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Run sequentially even if the config enables parallelism.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Number of best results to print.
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Output directory for sweep.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Write a seeded synthetic one-minute bar CSV.
    Synth {
        /// Destination CSV file.
        #[arg(long)]
        out: PathBuf,

        /// Number of bars to generate.
        #[arg(long, default_value_t = 10_080)]
        bars: usize,

        /// RNG seed; the same seed always yields the same bars.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Timestamp of the first bar (YYYY-MM-DD HH:MM:SS).
        #[arg(long, default_value = "2024-01-01 00:00:00")]
        start: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            output_dir,
        } => run_cmd(config, data, output_dir),
        Commands::Sweep {
            config,
            data,
            sequential,
            top,
            output_dir,
        } => sweep_cmd(config, data, sequential, top, output_dir),
        Commands::Synth {
            out,
            bars,
            seed,
            start,
        } => synth_cmd(out, bars, seed, &start),
    }
}

fn load_config(path: &Path, data: Option<PathBuf>) -> Result<BacktestConfig> {
    let mut config = BacktestConfig::from_file(path)?;
    if let Some(data) = data {
        config.data.path = data;
    }
    Ok(config)
}

fn run_cmd(config_path: PathBuf, data: Option<PathBuf>, output_dir: PathBuf) -> Result<()> {
    let config = load_config(&config_path, data)?;
    tracing::info!(run_id = %config.run_id()?, "config loaded");

    let report = run_from_config(&config)?;
    print_summary(&report);

    let paths = save_artifacts(&report, &output_dir)?;
    println!("Artifacts saved to: {}", paths.dir.display());
    Ok(())
}

fn sweep_cmd(
    config_path: PathBuf,
    data: Option<PathBuf>,
    sequential: bool,
    top: usize,
    output_dir: PathBuf,
) -> Result<()> {
    let config = load_config(&config_path, data)?;
    let Some(sweep) = config.sweep.as_ref() else {
        bail!("{} has no [sweep] table", config_path.display());
    };

    let bars = load_csv(&config.data.path)?.bars;
    let grid = ParamGrid::from(sweep);
    println!("Sweeping {} parameter sets over {} bars", grid.size(), bars.len());

    let results = registry_sweep(config.engine.clone(), config.strategy.name.clone())
        .with_base_params(config.strategy.params.clone())
        .with_parallelism(sweep.parallel && !sequential)
        .sweep(&grid, &bars)?;

    print_ranking(&results, top);
    let path = save_sweep(&results, &output_dir)?;
    println!("Sweep results saved to: {}", path.display());
    Ok(())
}

fn synth_cmd(out: PathBuf, count: usize, seed: u64, start: &str) -> Result<()> {
    if count == 0 {
        bail!("--bars must be at least 1");
    }
    let start = NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("invalid --start '{start}'"))?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = std::fs::File::create(&out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    write_csv(&synthetic_minute_bars(start, count, seed), file)?;

    println!("Wrote {count} synthetic bars to {} (seed {seed})", out.display());
    Ok(())
}

fn print_summary(report: &BacktestReport) {
    let s = &report.summary;
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", report.result.symbol);
    println!("Strategy:       {}", report.strategy);
    for (name, value) in &report.params {
        println!("  {name:<13} {value}");
    }
    println!("Bars:           {}", report.result.bar_count);
    println!(
        "Orders:         {} placed, {} still open",
        report.result.orders_placed, report.result.open_orders
    );
    println!("Trades:         {} ({} closing)", s.trade_count, s.closing_trades);
    println!();
    println!("--- Performance ---");
    println!("Gross P&L:      {:.2}", s.gross_pnl);
    println!("Commission:     {:.2}", s.total_commission);
    println!("Slippage:       {:.2}", s.total_slippage);
    println!("Net Profit:     {:.2}", s.net_profit);
    println!("Final Balance:  {:.2}", s.final_balance);
    println!("Final Position: {}", s.final_position);
    println!("Max Drawdown:   {:.2}%", s.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", s.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", s.profit_factor);
    println!("Turnover:       {:.2}", s.total_turnover);
    println!("Fingerprint:    {}", report.fingerprint);
    println!();
}

fn print_ranking(results: &SweepResults, top: usize) {
    println!();
    println!(
        "{:<4} {:<32} {:>8} {:>14} {:>10}",
        "Rank", "Params", "Trades", "Net Profit", "Max DD"
    );
    println!("{}", "-".repeat(72));
    for (rank, entry) in results.top_n(top).iter().enumerate() {
        let params: Vec<String> = entry.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!(
            "{:<4} {:<32} {:>8} {:>14.2} {:>9.2}%",
            rank + 1,
            params.join(" "),
            entry.summary.trade_count,
            entry.summary.net_profit,
            entry.summary.max_drawdown * 100.0
        );
    }
    println!();
}
