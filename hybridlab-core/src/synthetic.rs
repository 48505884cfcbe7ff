//! Monte Carlo series generation for stress-testing classifiers.
//!
//! Fits the mean and standard deviation of log returns on a price series (the
//! smoothed open in practice), then draws normally distributed returns and
//! compounds them from a starting price:
//!
//! price[k] = initial * prod_{j <= k} (1 + r[j]),  r ~ N(mean, std_dev)
//!
//! The output is an ordinary bar stream, so everything downstream of the
//! smoothing transform accepts it unchanged.

use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::error::{ensure_finite, CoreError};
use crate::indicators::{log_returns, mean, sample_std};

/// Distribution parameters of a series' log returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogReturnStats {
    pub mean: f64,
    pub std_dev: f64,
    pub sample_count: usize,
}

impl LogReturnStats {
    /// Fit on a price series. Needs at least 3 prices (2 returns).
    pub fn from_prices(prices: &[f64]) -> Result<Self, CoreError> {
        ensure_finite(prices, "price series")?;
        if prices.iter().any(|&p| p <= 0.0) {
            return Err(CoreError::InvalidInput(
                "log returns need strictly positive prices".into(),
            ));
        }
        let returns = log_returns(prices);
        match (mean(&returns), sample_std(&returns)) {
            (Some(mean), Some(std_dev)) => Ok(Self {
                mean,
                std_dev,
                sample_count: returns.len(),
            }),
            _ => Err(CoreError::InsufficientData(format!(
                "need at least 3 prices to fit return statistics, got {}",
                prices.len()
            ))),
        }
    }
}

/// Produces a synthetic bar sequence.
pub trait SeriesGenerator: Send + Sync {
    fn generate(&self, count: usize) -> Result<Vec<Bar>, CoreError>;
}

/// Seeded random-walk generator driven by fitted return statistics.
#[derive(Debug, Clone)]
pub struct MonteCarloGenerator {
    pub stats: LogReturnStats,
    pub initial_price: f64,
    pub seed: u64,
    pub start: NaiveDateTime,
    pub step: Duration,
}

impl MonteCarloGenerator {
    fn validate(&self) -> Result<(), CoreError> {
        if !self.initial_price.is_finite() || self.initial_price <= 0.0 {
            return Err(CoreError::Configuration(format!(
                "initial price must be positive, got {}",
                self.initial_price
            )));
        }
        if !self.stats.mean.is_finite() || !self.stats.std_dev.is_finite() || self.stats.std_dev < 0.0 {
            return Err(CoreError::Configuration(format!(
                "invalid return distribution (mean={}, std_dev={})",
                self.stats.mean, self.stats.std_dev
            )));
        }
        if self.step <= Duration::zero() {
            return Err(CoreError::Configuration("bar step must be positive".into()));
        }
        Ok(())
    }

    /// Draw the compounded price path.
    pub fn price_path(&self, count: usize) -> Result<Vec<f64>, CoreError> {
        self.validate()?;
        let normal = Normal::new(self.stats.mean, self.stats.std_dev)
            .map_err(|e| CoreError::Configuration(format!("invalid return distribution: {e}")))?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut price = self.initial_price;
        let mut path = Vec::with_capacity(count);
        for _ in 0..count {
            price *= 1.0 + normal.sample(&mut rng);
            path.push(price);
        }
        Ok(path)
    }
}

impl SeriesGenerator for MonteCarloGenerator {
    fn generate(&self, count: usize) -> Result<Vec<Bar>, CoreError> {
        let path = self.price_path(count)?;
        let mut ts = self.start;
        let mut bars = Vec::with_capacity(path.len());
        for price in path {
            bars.push(Bar::new(ts, price, price, price, price));
            ts += self.step;
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 1, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn generator(seed: u64) -> MonteCarloGenerator {
        MonteCarloGenerator {
            stats: LogReturnStats {
                mean: 0.0002,
                std_dev: 0.01,
                sample_count: 100,
            },
            initial_price: 4500.0,
            seed,
            start: start(),
            step: Duration::hours(4),
        }
    }

    #[test]
    fn stats_from_constant_growth() {
        let stats = LogReturnStats::from_prices(&[100.0, 110.0, 121.0]).unwrap();
        assert!((stats.mean - 1.1_f64.ln()).abs() < 1e-12);
        assert!(stats.std_dev.abs() < 1e-12);
        assert_eq!(stats.sample_count, 2);
    }

    #[test]
    fn stats_need_three_prices() {
        assert!(matches!(
            LogReturnStats::from_prices(&[100.0, 101.0]),
            Err(CoreError::InsufficientData(_))
        ));
    }

    #[test]
    fn stats_reject_non_positive_prices() {
        assert!(matches!(
            LogReturnStats::from_prices(&[100.0, 0.0, 101.0]),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn same_seed_same_path() {
        assert_eq!(generator(7).price_path(50).unwrap(), generator(7).price_path(50).unwrap());
    }

    #[test]
    fn different_seed_different_path() {
        assert_ne!(generator(7).price_path(50).unwrap(), generator(8).price_path(50).unwrap());
    }

    #[test]
    fn zero_volatility_is_deterministic_growth() {
        let mut g = generator(1);
        g.stats.std_dev = 0.0;
        g.stats.mean = 0.01;
        let path = g.price_path(2).unwrap();
        assert!((path[0] - 4545.0).abs() < 1e-9);
        assert!((path[1] - 4590.45).abs() < 1e-9);
    }

    #[test]
    fn generated_bars_are_ordered_and_finite() {
        let bars = generator(3).generate(100).unwrap();
        assert_eq!(bars.len(), 100);
        assert!(crate::domain::validate_bars(&bars).is_ok());
        assert_eq!(bars[1].timestamp - bars[0].timestamp, Duration::hours(4));
    }

    #[test]
    fn invalid_initial_price() {
        let mut g = generator(1);
        g.initial_price = -1.0;
        assert!(matches!(g.generate(10), Err(CoreError::Configuration(_))));
    }
}
