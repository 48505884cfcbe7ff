//! Trade simulator — turns a price series plus entry/exit flags into round trips.
//!
//! Two-state machine per direction:
//!
//! ```text
//!   FLAT --entries[i]--> IN_POSITION(i) --exits[j], j > i--> FLAT  (emit trade)
//! ```
//!
//! - Entries while in a position are ignored (no pyramiding).
//! - One transition per bar: the bar that closes a trade cannot reopen.
//! - A position still open at the end of the series is dropped.
//!
//! Long and short run as independent instances with no shared state.

use tracing::debug;

use crate::domain::{AdjustedTrade, Direction, Trade};
use crate::engine::config::validate_slippage;
use crate::engine::ledger::adjust_trades;
use crate::error::{ensure_finite, CoreError};
use crate::signals::EventStreams;

/// Simulator state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    Flat,
    InPosition { entry_index: usize, entry_price: f64 },
}

/// Single-direction trade simulator.
#[derive(Debug, Clone, Copy)]
pub struct TradeSimulator {
    direction: Direction,
}

impl TradeSimulator {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Run the state machine and return completed trades at raw prices.
    pub fn run(&self, prices: &[f64], events: &EventStreams) -> Result<Vec<Trade>, CoreError> {
        check_lengths(prices, &events.entries, &events.exits)?;
        ensure_finite(prices, "price series")?;

        let mut trades = Vec::new();
        let mut state = PositionState::Flat;

        for (i, &price) in prices.iter().enumerate() {
            match state {
                PositionState::Flat => {
                    if events.entries[i] {
                        debug!(direction = %self.direction, bar = i, price, "open position");
                        state = PositionState::InPosition {
                            entry_index: i,
                            entry_price: price,
                        };
                    }
                }
                PositionState::InPosition {
                    entry_index,
                    entry_price,
                } => {
                    if events.exits[i] {
                        debug!(direction = %self.direction, bar = i, price, entry_index, "close position");
                        trades.push(Trade {
                            direction: self.direction,
                            entry_index,
                            entry_price,
                            exit_index: i,
                            exit_price: price,
                        });
                        state = PositionState::Flat;
                    }
                }
            }
        }

        if let PositionState::InPosition { entry_index, .. } = state {
            debug!(direction = %self.direction, entry_index, "position open at series end, not counted");
        }

        Ok(trades)
    }
}

/// Simulate one direction and return slippage-adjusted trades with running
/// cumulative PnL.
pub fn simulate(
    prices: &[f64],
    entries: &[bool],
    exits: &[bool],
    slippage: f64,
    direction: Direction,
) -> Result<Vec<AdjustedTrade>, CoreError> {
    validate_slippage(slippage)?;
    check_lengths(prices, entries, exits)?;
    let events = EventStreams {
        entries: entries.to_vec(),
        exits: exits.to_vec(),
    };
    let trades = TradeSimulator::new(direction).run(prices, &events)?;
    Ok(adjust_trades(&trades, slippage))
}

fn check_lengths(prices: &[f64], entries: &[bool], exits: &[bool]) -> Result<(), CoreError> {
    if entries.len() != prices.len() {
        return Err(CoreError::length_mismatch("entry stream", prices.len(), entries.len()));
    }
    if exits.len() != prices.len() {
        return Err(CoreError::length_mismatch("exit stream", prices.len(), exits.len()));
    }
    Ok(())
}
