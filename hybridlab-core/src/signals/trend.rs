//! Trend filter — fast/slow EMA crossover with a one-bar execution delay.
//!
//! Raw state at i: 1 if fast EMA > slow EMA, else 0.
//! Signal at i: raw[i] - raw[i-1] (a change-of-state diff, 0 at index 0).
//! Trend state at i: the signal computed at i-1.
//!
//! The shift is the look-ahead guard: a crossover detected from bar i's
//! smoothed open only becomes actionable at bar i+1. Trend state at index 0 is
//! always Flat.

use crate::domain::Signal;
use crate::error::CoreError;
use crate::indicators::Ema;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendFilter {
    fast: Ema,
    slow: Ema,
}

impl TrendFilter {
    pub fn new(fast_span: usize, slow_span: usize) -> Result<Self, CoreError> {
        Ok(Self {
            fast: Ema::new(fast_span)?,
            slow: Ema::new(slow_span)?,
        })
    }

    pub fn fast_span(&self) -> usize {
        self.fast.span()
    }

    pub fn slow_span(&self) -> usize {
        self.slow.span()
    }

    /// Fast and slow EMA series over the input.
    pub fn emas(&self, open: &[f64]) -> Result<(Vec<f64>, Vec<f64>), CoreError> {
        if open.is_empty() {
            return Err(CoreError::InvalidInput("trend input series is empty".into()));
        }
        Ok((self.fast.compute(open)?, self.slow.compute(open)?))
    }

    /// Unshifted crossover state: 1 where fast > slow, else 0.
    pub fn raw_state(&self, open: &[f64]) -> Result<Vec<u8>, CoreError> {
        let (fast, slow) = self.emas(open)?;
        Ok(fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| u8::from(f > s))
            .collect())
    }

    /// Trend state per bar: the shifted change-of-state signal.
    pub fn trend(&self, open: &[f64]) -> Result<Vec<Signal>, CoreError> {
        let raw = self.raw_state(open)?;
        Ok(shift_forward(&state_changes(&raw)))
    }
}

/// Diff of a 0/1 state series. Index 0 has no prior state and is Flat.
pub fn state_changes(raw: &[u8]) -> Vec<Signal> {
    let mut out = Vec::with_capacity(raw.len());
    for i in 0..raw.len() {
        if i == 0 {
            out.push(Signal::Flat);
        } else {
            out.push(Signal::from_diff(raw[i] as i8 - raw[i - 1] as i8));
        }
    }
    out
}

/// Delay a signal series by exactly one bar, filling index 0 with Flat.
pub fn shift_forward(signals: &[Signal]) -> Vec<Signal> {
    if signals.is_empty() {
        return Vec::new();
    }
    std::iter::once(Signal::Flat)
        .chain(signals[..signals.len() - 1].iter().copied())
        .collect()
}
