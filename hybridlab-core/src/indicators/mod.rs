//! Series transforms: Heikin-Ashi smoothing, EMA, and return helpers.
//!
//! Every transform maps an input series to an output of the same length (or,
//! for returns, one shorter) and never reads past the current index.

pub mod ema;
pub mod heikin_ashi;
pub mod returns;

pub use ema::{ema_of_series, Ema};
pub use heikin_ashi::smooth;
pub use returns::{log_returns, mean, pct_change, prefix_sum, sample_std};

/// Create bars from (open, high, low, close) tuples for testing, one every 4 hours.
#[cfg(test)]
pub fn make_ohlc_bars(ohlc: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2022, 1, 3)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    ohlc.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(base + chrono::Duration::hours(4 * i as i64), open, high, low, close)
        })
        .collect()
}

/// Create bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high/low = +/- 1.0 around
/// the body.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    let ohlc: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_bars(&ohlc)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
