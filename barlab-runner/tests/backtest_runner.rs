//! End-to-end runner tests: config file → CSV feed → report → artifacts.

use barlab_runner::data_loader::write_csv;
use barlab_runner::{
    load_csv, registry_sweep, run_from_config, save_artifacts, save_sweep,
    synthetic_minute_bars, BacktestConfig, LoadError, ParamGrid, RunError,
};
use chrono::NaiveDate;
use std::path::Path;

fn write_feed(dir: &Path, bars: usize) -> std::path::PathBuf {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let path = dir.join("bars.csv");
    let file = std::fs::File::create(&path).unwrap();
    write_csv(&synthetic_minute_bars(start, bars, 11), file).unwrap();
    path
}

fn config_for(data: &Path) -> BacktestConfig {
    BacktestConfig::from_toml(&format!(
        r#"
[engine]
symbol = "BTCUSDT"
initial_cash = 100000.0

[data]
path = "{}"

[strategy]
name = "channel_breakout"
params = {{ window = 15, quantity = 1 }}

[sweep]
parallel = false
params = {{ window = [5, 15], quantity = [1, 3] }}
"#,
        data.display()
    ))
    .unwrap()
}

#[test]
fn config_file_run_writes_all_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let feed = write_feed(dir.path(), 1_440);
    let config_path = dir.path().join("barlab.toml");
    std::fs::write(
        &config_path,
        toml::to_string(&config_for(&feed)).unwrap(),
    )
    .unwrap();

    let config = BacktestConfig::from_file(&config_path).unwrap();
    let report = run_from_config(&config).unwrap();
    assert_eq!(report.result.bar_count, 1_440);
    assert_eq!(report.rows.len(), report.result.trades.len());
    assert_eq!(report.dataset_hash, load_csv(&feed).unwrap().dataset_hash);

    let out = dir.path().join("out");
    let paths = save_artifacts(&report, &out).unwrap();
    for path in [
        &paths.report_csv,
        &paths.trades_csv,
        &paths.records_csv,
        &paths.summary_json,
    ] {
        assert!(path.exists(), "{} missing", path.display());
    }

    let records = std::fs::read_to_string(&paths.records_csv).unwrap();
    assert!(records.starts_with("datetime,channel_high,channel_low"));
    // 1440 minutes / 15 = 96 completed windows.
    assert_eq!(records.lines().count(), 97);
}

#[test]
fn sweep_from_config_table() {
    let dir = tempfile::tempdir().unwrap();
    let feed = write_feed(dir.path(), 600);
    let config = config_for(&feed);
    let sweep = config.sweep.as_ref().unwrap();
    let bars = load_csv(&feed).unwrap().bars;

    let results = registry_sweep(config.engine.clone(), config.strategy.name.clone())
        .with_base_params(config.strategy.params.clone())
        .with_parallelism(sweep.parallel)
        .sweep(&ParamGrid::from(sweep), &bars)
        .unwrap();
    assert_eq!(results.len(), 4);

    let path = save_sweep(&results, dir.path()).unwrap();
    let csv = std::fs::read_to_string(path).unwrap();
    assert!(csv.starts_with("quantity,window,trades"));
    assert_eq!(csv.lines().count(), 5);
}

#[test]
fn missing_feed_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&dir.path().join("absent.csv"));
    let err = run_from_config(&config).unwrap_err();
    assert!(matches!(err, RunError::Data(LoadError::Io { .. })));
}

#[test]
fn header_only_feed_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "open_time,open,high,low,close,volume\n").unwrap();
    assert!(matches!(load_csv(&path), Err(LoadError::Empty(_))));
}

#[test]
fn unknown_strategy_in_config() {
    let dir = tempfile::tempdir().unwrap();
    let feed = write_feed(dir.path(), 10);
    let mut config = config_for(&feed);
    config.strategy.name = "grid_bot".into();
    assert!(matches!(
        run_from_config(&config),
        Err(RunError::UnknownStrategy(_))
    ));
}
