//! Heikin-Ashi smoothing transform.
//!
//! close[i] = mean(open, high, low, close) of raw bar i
//! open[0]  = raw open[0]
//! open[i]  = mean(open[i-1], close[i-1]) of the smoothed series
//! high[i]  = max(open[i], close[i], raw high[i])
//! low[i]   = min(open[i], close[i], raw low[i])
//!
//! Sequential recurrence: each smoothed open depends on the previous smoothed
//! bar, so the transform runs front to back in a single pass.

use crate::domain::{validate_bars, Bar, SmoothedBar};
use crate::error::CoreError;

/// Convert raw bars into Heikin-Ashi bars (same length, 1:1 by index).
pub fn smooth(bars: &[Bar]) -> Result<Vec<SmoothedBar>, CoreError> {
    validate_bars(bars)?;

    let mut out: Vec<SmoothedBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        let close = bar.ohlc_mean();
        let open = match out.last() {
            Some(prev) => (prev.open + prev.close) / 2.0,
            None => bar.open,
        };
        out.push(SmoothedBar {
            timestamp: bar.timestamp,
            open,
            high: open.max(close).max(bar.high),
            low: open.min(close).min(bar.low),
            close,
        });
    }
    Ok(out)
}
