//! Bar loading for the runner.
//!
//! Reads a CSV bar feed with header `open_time,open,high,low,close,volume`.
//! `open_time` may be `YYYY-MM-DD HH:MM:SS`, RFC 3339, or integer epoch
//! milliseconds. Every row is checked before anything reaches the engine:
//! timestamps must strictly increase and OHLC values must be finite with
//! `low <= open, close <= high`. Errors carry the 1-based data row.
//!
//! The synthetic generator is a developer-only mode for demos and tests.

use barlab_core::domain::Bar;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Deserialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognized open_time '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("row {row}: bar at {timestamp} has non-finite or inconsistent OHLC values")]
    InvalidBar { row: usize, timestamp: NaiveDateTime },

    #[error("row {row}: bar at {current} is not after the previous bar at {previous}")]
    OutOfOrder {
        row: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("no bars in {0}")]
    Empty(PathBuf),
}

/// Result of loading bars, with provenance for fingerprinting.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub bars: Vec<Bar>,
    /// BLAKE3 over every bar's timestamp and OHLCV values.
    pub dataset_hash: String,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    open_time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load and validate bars from a CSV file.
pub fn load_csv(path: &Path) -> Result<LoadedBars, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_csv(file)?;
    if bars.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    tracing::info!(
        path = %path.display(),
        bars = bars.len(),
        first = %bars[0].timestamp,
        last = %bars[bars.len() - 1].timestamp,
        "loaded bars"
    );
    let dataset_hash = dataset_hash(&bars);
    Ok(LoadedBars { bars, dataset_hash })
}

/// Parse and validate bars from any CSV reader.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars: Vec<Bar> = Vec::new();

    for (i, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = i + 1;
        let raw = record?;
        let timestamp = parse_open_time(&raw.open_time).ok_or_else(|| LoadError::Timestamp {
            row,
            value: raw.open_time.clone(),
        })?;
        let bar = Bar::new(timestamp, raw.open, raw.high, raw.low, raw.close, raw.volume);

        if !bar.is_sane() {
            return Err(LoadError::InvalidBar { row, timestamp });
        }
        if let Some(prev) = bars.last() {
            if bar.timestamp <= prev.timestamp {
                return Err(LoadError::OutOfOrder {
                    row,
                    previous: prev.timestamp,
                    current: bar.timestamp,
                });
            }
        }
        bars.push(bar);
    }

    Ok(bars)
}

/// Parse an `open_time` field in any of the accepted formats.
///
/// RFC 3339 values are converted to UTC before dropping the offset.
pub fn parse_open_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|ts| ts.naive_utc())
}

/// Write bars as CSV in the format [`read_csv`] accepts.
pub fn write_csv<W: Write>(bars: &[Bar], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["open_time", "open", "high", "low", "close", "volume"])?;
    for bar in bars {
        wtr.write_record([
            bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Compute a deterministic BLAKE3 hash over all bar data.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.and_utc().timestamp_millis().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate `count` synthetic one-minute bars starting at `start`.
///
/// A seeded random walk from 100.0; the same seed always yields the same bars.
pub fn synthetic_minute_bars(start: NaiveDateTime, count: usize, seed: u64) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;

    for i in 0..count {
        let minute_return: f64 = rng.gen_range(-0.002..0.002);
        let open = price;
        let close = price * (1.0 + minute_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.001));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.001));
        let volume = rng.gen_range(1.0..50.0);

        bars.push(Bar::new(
            start + Duration::minutes(i as i64),
            open,
            high,
            low,
            close,
            volume,
        ));
        price = close;
    }

    bars
}
