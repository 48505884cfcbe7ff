//! SmoothedBar — Heikin-Ashi representation of a bar.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// Heikin-Ashi OHLC derived from a raw bar and the previous smoothed bar.
///
/// Invariants (for every index):
/// - `low <= min(open, close)` and `high >= max(open, close)`
/// - `close` is the mean of the raw bar's OHLC
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Take a bar that is already on the smoothed scale as-is, field for field.
impl From<Bar> for SmoothedBar {
    fn from(bar: Bar) -> Self {
        Self {
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        }
    }
}

/// Extract the smoothed open series, the price the strategy trades at.
pub fn open_series(bars: &[SmoothedBar]) -> Vec<f64> {
    bars.iter().map(|b| b.open).collect()
}
