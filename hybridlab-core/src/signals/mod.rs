//! Signal generation: trend filter, fusion with direction labels, and
//! derivation of per-direction entry/exit event streams.

pub mod events;
pub mod fusion;
pub mod trend;

pub use events::{crossed_above, crossed_below, EventStreams};
pub use fusion::{fuse, fuse_series, fuse_two_stage};
pub use trend::{shift_forward, state_changes, TrendFilter};
