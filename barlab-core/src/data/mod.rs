//! Market data transforms

pub mod aggregate;

pub use aggregate::{AggregateError, BarAggregator, Interval};
