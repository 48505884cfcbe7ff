//! Domain types for HybridLab

pub mod bar;
pub mod signal;
pub mod smoothed;
pub mod trade;

pub use bar::{validate_bars, Bar};
pub use signal::{DirectionLabel, Signal};
pub use smoothed::SmoothedBar;
pub use trade::{AdjustedTrade, Direction, Trade};
