//! Trade records — raw round trips and their slippage-adjusted form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading direction. Each direction runs its own simulator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// A completed round trip at raw (unadjusted) prices.
///
/// Invariant: `exit_index > entry_index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub direction: Direction,
    pub entry_index: usize,
    pub entry_price: f64,
    pub exit_index: usize,
    pub exit_price: f64,
}

impl Trade {
    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }

    /// Apply per-side slippage against the trade.
    ///
    /// Long: pay up on entry, give up on exit. Short: sell lower on entry,
    /// buy back higher on exit. Both bias PnL pessimistically.
    pub fn adjust(&self, slippage: f64) -> AdjustedTrade {
        let (entry_price_adj, exit_price_adj) = match self.direction {
            Direction::Long => (self.entry_price + slippage, self.exit_price - slippage),
            Direction::Short => (self.entry_price - slippage, self.exit_price + slippage),
        };
        let pnl = self.direction.sign() * (exit_price_adj - entry_price_adj);
        AdjustedTrade {
            trade: *self,
            entry_price_adj,
            exit_price_adj,
            pnl,
            cumulative_pnl: pnl,
        }
    }
}

/// A trade with slippage-adjusted prices, PnL in price points, and the running
/// cumulative PnL over its trade log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedTrade {
    #[serde(flatten)]
    pub trade: Trade,
    pub entry_price_adj: f64,
    pub exit_price_adj: f64,
    pub pnl: f64,
    pub cumulative_pnl: f64,
}

impl AdjustedTrade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}
