//! Strategy parameters and contract sizing.
//!
//! Every value here is caller-supplied; the engine bakes in no defaults.
//! Slippage differs per direction and per instrument, so both sides are
//! explicit inputs.

use serde::{Deserialize, Serialize};

use crate::domain::Direction;
use crate::error::CoreError;

/// Where the per-direction entry/exit streams come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Entries/exits from the two-stage fused signal.
    FusedSignal,
    /// Entries/exits from fast/slow crossovers on the price series.
    Crossover,
}

/// Futures-style contract sizing used to dollarize point PnL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContractSpec {
    /// Dollars per point (e.g. 50.0 for one index future, 2500.0 for a rates future).
    pub multiplier: f64,
    /// Fixed number of contracts per trade.
    pub contracts: u32,
}

impl ContractSpec {
    pub fn new(multiplier: f64, contracts: u32) -> Result<Self, CoreError> {
        let spec = Self {
            multiplier,
            contracts,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(CoreError::Configuration(format!(
                "contract multiplier must be positive, got {}",
                self.multiplier
            )));
        }
        if self.contracts == 0 {
            return Err(CoreError::Configuration("contract count must be >= 1".into()));
        }
        Ok(())
    }

    /// Convert price points to dollars.
    pub fn dollarize(&self, points: f64) -> f64 {
        points * self.multiplier * self.contracts as f64
    }
}

/// Full parameter set for one backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub fast_span: usize,
    pub slow_span: usize,
    /// Price points of slippage per side for long trades.
    pub long_slippage: f64,
    /// Price points of slippage per side for short trades.
    pub short_slippage: f64,
    pub event_source: EventSource,
    pub contract: ContractSpec,
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.fast_span == 0 || self.slow_span == 0 {
            return Err(CoreError::Configuration(format!(
                "EMA spans must be >= 1 (fast={}, slow={})",
                self.fast_span, self.slow_span
            )));
        }
        validate_slippage(self.long_slippage)?;
        validate_slippage(self.short_slippage)?;
        self.contract.validate()
    }

    pub fn slippage(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Long => self.long_slippage,
            Direction::Short => self.short_slippage,
        }
    }
}

pub(crate) fn validate_slippage(slippage: f64) -> Result<(), CoreError> {
    if !slippage.is_finite() || slippage < 0.0 {
        return Err(CoreError::Configuration(format!(
            "slippage must be finite and >= 0, got {slippage}"
        )));
    }
    Ok(())
}
