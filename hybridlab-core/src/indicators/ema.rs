//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1]
//! Seed: EMA[0] = x[0] (no SMA warmup window).
//! alpha = 2 / (span + 1), so span 1 reproduces the input exactly.

use crate::error::{ensure_finite, CoreError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Result<Self, CoreError> {
        if span == 0 {
            return Err(CoreError::Configuration("EMA span must be >= 1".into()));
        }
        Ok(Self { span })
    }

    pub fn span(&self) -> usize {
        self.span
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.span as f64 + 1.0)
    }

    /// Compute the EMA over a finite series. Output length equals input length.
    pub fn compute(&self, values: &[f64]) -> Result<Vec<f64>, CoreError> {
        ensure_finite(values, "EMA input")?;
        let alpha = self.alpha();
        let mut result = Vec::with_capacity(values.len());
        let mut prev: Option<f64> = None;
        for &x in values {
            let ema = match prev {
                Some(p) => alpha * x + (1.0 - alpha) * p,
                None => x,
            };
            result.push(ema);
            prev = Some(ema);
        }
        Ok(result)
    }
}

/// Compute EMA values of a series for a given span.
pub fn ema_of_series(values: &[f64], span: usize) -> Result<Vec<f64>, CoreError> {
    Ema::new(span)?.compute(values)
}
