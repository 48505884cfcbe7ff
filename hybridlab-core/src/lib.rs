//! HybridLab Core — Heikin-Ashi momentum fused with a directional classifier.
//!
//! This crate contains the signal-fusion and trade-simulation engine:
//! - Domain types (bars, smoothed bars, signals, labels, trades)
//! - Heikin-Ashi smoothing and EMA series transforms
//! - Trend filter with a one-bar execution delay
//! - Two-stage signal fusion against direction labels
//! - Per-direction trade simulator with slippage and cumulative PnL
//! - Classifier and Monte Carlo series contracts with deterministic implementations
//!
//! Everything is synchronous and stateless between calls.

pub mod classifier;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod signals;
pub mod synthetic;

pub use error::CoreError;
