use serde::{Deserialize, Serialize};
use std::fmt;

/// Order ID, assigned in submission order starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade ID, assigned in fill order starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeId(pub u64);

impl From<u64> for TradeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic ID sequence.
///
/// Each run owns its own sequences, so two runs over the same input hand out
/// the same IDs in the same order.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    last: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and return the next ID.
    pub fn next_id<T: From<u64>>(&mut self) -> T {
        self.last += 1;
        T::from(self.last)
    }

    /// Number of IDs handed out so far.
    pub fn issued(&self) -> u64 {
        self.last
    }
}
