//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a bar is unusable by the engine.
#[derive(Debug, Error, PartialEq)]
pub enum BarError {
    #[error("bar at {timestamp} has a non-finite {field}")]
    NonFinite {
        timestamp: NaiveDateTime,
        field: &'static str,
    },

    #[error("bar at {timestamp} is inconsistent: high {high} below low {low}")]
    Inverted {
        timestamp: NaiveDateTime,
        high: f64,
        low: f64,
    },
}

/// OHLCV bar for the traded instrument over one time window.
///
/// Produced by the data feed for the base timeframe and synthesized by
/// [`BarAggregator`](crate::data::BarAggregator) for coarser ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any OHLCV field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        self.fields().iter().any(|(_, v)| !v.is_finite())
    }

    /// Basic OHLC sanity check: low <= open, close <= high.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Reject bars the matching engine cannot price against.
    ///
    /// Only non-finite values and an inverted high/low range are errors. An
    /// open or close outside the range is tolerated here and left to the
    /// loader's stricter [`is_sane`](Self::is_sane) check.
    pub fn validate(&self) -> Result<(), BarError> {
        if let Some((field, _)) = self.fields().into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(BarError::NonFinite {
                timestamp: self.timestamp,
                field,
            });
        }
        if self.high < self.low {
            return Err(BarError::Inverted {
                timestamp: self.timestamp,
                high: self.high,
                low: self.low,
            });
        }
        Ok(())
    }

    fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
    }
}
