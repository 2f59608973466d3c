//! Bar aggregation: folds base-timeframe bars into coarser fixed-width windows.
//!
//! Window boundaries follow the base bar clock:
//! - Minute mode closes a window on the bar whose `(minute + 1) % width == 0`,
//!   so the width should divide 60. Other widths are accepted but produce
//!   windows that drift across the hour.
//! - Hour mode closes on hour-boundary crossings: the first base bar whose
//!   hour differs from its predecessor's. That bar is folded into the closing
//!   window. A width of N closes on every Nth crossing.

use crate::domain::Bar;
use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from constructing or feeding a [`BarAggregator`].
#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("window width must be at least 1")]
    ZeroWindow,

    #[error("bar at {current} is not after the previous bar at {previous}")]
    OutOfOrder {
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
}

/// Timeframe unit of the aggregate windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    Minute,
    Hour,
}

/// Window accumulator for one output timeframe.
#[derive(Debug, Clone)]
pub struct BarAggregator {
    window: u32,
    interval: Interval,
    hour_crossings: u32,
    window_bar: Option<Bar>,
    last: Option<(NaiveDateTime, u32)>,
}

impl BarAggregator {
    pub fn new(window: u32, interval: Interval) -> Result<Self, AggregateError> {
        if window == 0 {
            return Err(AggregateError::ZeroWindow);
        }
        if interval == Interval::Minute && 60 % window != 0 {
            tracing::warn!(
                window,
                "minute window does not divide 60; windows will not align to the hour"
            );
        }
        Ok(Self {
            window,
            interval,
            hour_crossings: 0,
            window_bar: None,
            last: None,
        })
    }

    /// Aggregator producing `window`-minute bars.
    pub fn minutes(window: u32) -> Result<Self, AggregateError> {
        Self::new(window, Interval::Minute)
    }

    /// Aggregator producing `window`-hour bars.
    pub fn hours(window: u32) -> Result<Self, AggregateError> {
        Self::new(window, Interval::Hour)
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// The window currently being accumulated, if any.
    pub fn pending(&self) -> Option<&Bar> {
        self.window_bar.as_ref()
    }

    /// Fold one base bar into the current window.
    ///
    /// Returns the completed window when this bar closes it. A bar that is not
    /// strictly after the previous one is rejected and leaves the accumulator
    /// untouched.
    pub fn update(&mut self, bar: &Bar) -> Result<Option<Bar>, AggregateError> {
        if let Some((previous, _)) = self.last {
            if bar.timestamp <= previous {
                return Err(AggregateError::OutOfOrder {
                    previous,
                    current: bar.timestamp,
                });
            }
        }

        match self.window_bar.as_mut() {
            None => {
                self.window_bar = Some(Bar {
                    timestamp: self.window_start(bar.timestamp),
                    ..bar.clone()
                });
            }
            Some(window_bar) => {
                window_bar.high = window_bar.high.max(bar.high);
                window_bar.low = window_bar.low.min(bar.low);
                window_bar.close = bar.close;
                window_bar.volume += bar.volume;
            }
        }

        let finished = match self.interval {
            Interval::Minute => (bar.timestamp.minute() + 1) % self.window == 0,
            Interval::Hour => self.crossed_hour(bar.timestamp.hour()),
        };

        self.last = Some((bar.timestamp, bar.timestamp.hour()));

        if finished {
            Ok(self.window_bar.take())
        } else {
            Ok(None)
        }
    }

    fn crossed_hour(&mut self, hour: u32) -> bool {
        let crossed = matches!(self.last, Some((_, last_hour)) if last_hour != hour);
        if !crossed {
            return false;
        }
        if self.window == 1 {
            return true;
        }
        self.hour_crossings += 1;
        if self.hour_crossings % self.window == 0 {
            self.hour_crossings = 0;
            true
        } else {
            false
        }
    }

    fn window_start(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let minute = match self.interval {
            Interval::Minute => ts.minute(),
            Interval::Hour => 0,
        };
        NaiveTime::from_hms_opt(ts.hour(), minute, 0)
            .map(|time| ts.date().and_time(time))
            .unwrap_or(ts)
    }
}
