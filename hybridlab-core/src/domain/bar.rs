//! Bar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// OHLC bar for a single instrument over one sampling interval.
///
/// Bars form an ordered sequence indexed `0..N-1`; timestamps are strictly
/// increasing. Immutable once ingested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(timestamp: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Returns true if every OHLC field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }

    /// Basic OHLC sanity check: high is the top of the range, low the bottom.
    pub fn is_sane(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Arithmetic mean of the four OHLC prices.
    pub fn ohlc_mean(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }
}

/// Validate a bar sequence: non-empty, finite, strictly increasing timestamps.
///
/// OHLC ordering (`is_sane`) is not enforced; vendor feeds and synthetic
/// series occasionally carry inverted ranges and the smoothing transform is
/// still well defined for them.
pub fn validate_bars(bars: &[Bar]) -> Result<(), CoreError> {
    if bars.is_empty() {
        return Err(CoreError::InvalidInput("bar sequence is empty".into()));
    }
    for (i, bar) in bars.iter().enumerate() {
        if !bar.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "bar {i} ({}) has a non-finite OHLC value",
                bar.timestamp
            )));
        }
        if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
            return Err(CoreError::InvalidInput(format!(
                "bar {i} timestamp {} is not after {}",
                bar.timestamp,
                bars[i - 1].timestamp
            )));
        }
    }
    Ok(())
}
