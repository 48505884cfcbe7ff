//! Backtesting engine — trade simulation, ledger, and the full pipeline.
//!
//! The simulator is a two-state machine run once per direction. The ledger
//! applies slippage and folds cumulative PnL. The pipeline wires smoothing,
//! trend filter, fusion, and simulation together for one instrument.

pub mod config;
pub mod ledger;
pub mod pipeline;
pub mod simulator;

pub use config::{ContractSpec, EventSource, StrategyParams};
pub use ledger::{adjust_trades, TradeLog, TradeSummary};
pub use pipeline::{Pipeline, PipelineOutput};
pub use simulator::{simulate, PositionState, TradeSimulator};
