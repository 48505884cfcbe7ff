//! Signal fusion — gate a trend signal with a directional label.
//!
//! | trend | label | fused |
//! |-------|-------|-------|
//! |  +1   |  UP   |  +1   |
//! |  +1   | DOWN  |   0   |
//! |   0   |  UP   |   0   |
//! |   0   | DOWN  |   0   |
//! |  -1   |  UP   |   0   |
//! |  -1   | DOWN  |  -1   |
//!
//! The trend's bias is acted on only when the label agrees. Disagreement goes
//! flat; the trend's sign is never flipped. The full pipeline applies the same
//! function twice (trend vs realized direction, then that result vs the
//! classifier's prediction).

use crate::domain::{DirectionLabel, Signal};
use crate::error::CoreError;

/// Fuse one trend state with one label.
pub fn fuse(trend: Signal, label: DirectionLabel) -> Signal {
    match (trend, label) {
        (Signal::Long, DirectionLabel::Up) => Signal::Long,
        (Signal::Short, DirectionLabel::Down) => Signal::Short,
        _ => Signal::Flat,
    }
}

/// Fuse index-aligned series. Lengths must match.
pub fn fuse_series(trend: &[Signal], labels: &[DirectionLabel]) -> Result<Vec<Signal>, CoreError> {
    if trend.len() != labels.len() {
        return Err(CoreError::length_mismatch("label series", trend.len(), labels.len()));
    }
    Ok(trend
        .iter()
        .zip(labels)
        .map(|(&t, &l)| fuse(t, l))
        .collect())
}

/// Two-stage fusion: trend gated by the realized direction, then by the
/// classifier's prediction. Returns the stage-1 momentum signal alongside the
/// final signal.
pub fn fuse_two_stage(
    trend: &[Signal],
    realized: &[DirectionLabel],
    predicted: &[DirectionLabel],
) -> Result<(Vec<Signal>, Vec<Signal>), CoreError> {
    let momentum = fuse_series(trend, realized)?;
    let fused = fuse_series(&momentum, predicted)?;
    Ok((momentum, fused))
}
