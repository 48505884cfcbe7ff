//! Trade ledger — slippage adjustment, cumulative PnL, and per-direction logs.
//!
//! Cumulative PnL is a prefix-sum fold over trades in close order, producing a
//! new sequence; nothing is mutated in place after construction.

use serde::{Deserialize, Serialize};

use crate::domain::{AdjustedTrade, Direction, Trade};
use crate::engine::config::ContractSpec;

/// Adjust each trade for slippage and assign the running cumulative PnL.
pub fn adjust_trades(trades: &[Trade], slippage: f64) -> Vec<AdjustedTrade> {
    trades
        .iter()
        .scan(0.0, |cumulative, trade| {
            let mut adjusted = trade.adjust(slippage);
            *cumulative += adjusted.pnl;
            adjusted.cumulative_pnl = *cumulative;
            Some(adjusted)
        })
        .collect()
}

/// Aggregate scalars for one direction's trade log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    pub trade_count: usize,
    /// Sum of per-trade PnL in price points. 0.0 for an empty log.
    pub total_points: f64,
    /// Mean PnL per trade in points. Undefined (None) for an empty log.
    pub mean_points: Option<f64>,
}

/// Ordered, immutable log of adjusted trades for one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLog {
    pub direction: Direction,
    pub slippage: f64,
    pub trades: Vec<AdjustedTrade>,
}

impl TradeLog {
    pub fn new(direction: Direction, slippage: f64, trades: &[Trade]) -> Self {
        Self {
            direction,
            slippage,
            trades: adjust_trades(trades, slippage),
        }
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn total_points(&self) -> f64 {
        self.trades.last().map_or(0.0, |t| t.cumulative_pnl)
    }

    pub fn summary(&self) -> TradeSummary {
        let trade_count = self.trades.len();
        let total_points = self.total_points();
        TradeSummary {
            trade_count,
            total_points,
            mean_points: (trade_count > 0).then(|| total_points / trade_count as f64),
        }
    }

    /// Cumulative PnL after each trade (the per-trade equity curve in points).
    pub fn equity_curve(&self) -> Vec<f64> {
        self.trades.iter().map(|t| t.cumulative_pnl).collect()
    }

    /// Cumulative PnL in dollars after each trade.
    pub fn equity_curve_usd(&self, contract: &ContractSpec) -> Vec<f64> {
        self.trades
            .iter()
            .map(|t| contract.dollarize(t.cumulative_pnl))
            .collect()
    }

    /// Realized cumulative PnL at every bar, stepping up on each exit bar.
    pub fn equity_by_bar(&self, bar_count: usize) -> Vec<f64> {
        let mut curve = vec![0.0; bar_count];
        let mut realized = 0.0;
        let mut next = self.trades.iter().peekable();
        for (i, slot) in curve.iter_mut().enumerate() {
            while let Some(t) = next.next_if(|t| t.trade.exit_index == i) {
                realized = t.cumulative_pnl;
            }
            *slot = realized;
        }
        curve
    }
}
