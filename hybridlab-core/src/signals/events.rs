//! Entry/exit event streams, one pair per trading direction.
//!
//! Two ways to derive them:
//! - From a fused signal series: a long enters on +1 and exits on -1; a short
//!   enters on -1 and exits on +1.
//! - From a fast/slow crossover directly (pure momentum): a long enters when
//!   fast crosses above slow and exits when it crosses below; shorts mirror.

use serde::{Deserialize, Serialize};

use crate::domain::{Direction, Signal};
use crate::error::CoreError;

/// Boolean entry and exit flags per bar for one direction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventStreams {
    pub entries: Vec<bool>,
    pub exits: Vec<bool>,
}

impl EventStreams {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.iter().filter(|&&e| e).count()
    }

    pub fn exit_count(&self) -> usize {
        self.exits.iter().filter(|&&e| e).count()
    }

    /// Derive events for `direction` from a fused signal series.
    pub fn from_signals(signals: &[Signal], direction: Direction) -> Self {
        let (enter_on, exit_on) = match direction {
            Direction::Long => (Signal::Long, Signal::Short),
            Direction::Short => (Signal::Short, Signal::Long),
        };
        Self {
            entries: signals.iter().map(|&s| s == enter_on).collect(),
            exits: signals.iter().map(|&s| s == exit_on).collect(),
        }
    }

    /// Derive events for `direction` from fast/slow crossovers.
    pub fn from_crossover(fast: &[f64], slow: &[f64], direction: Direction) -> Result<Self, CoreError> {
        if fast.len() != slow.len() {
            return Err(CoreError::length_mismatch("slow series", fast.len(), slow.len()));
        }
        let above = crossed_above(fast, slow);
        let below = crossed_below(fast, slow);
        Ok(match direction {
            Direction::Long => Self {
                entries: above,
                exits: below,
            },
            Direction::Short => Self {
                entries: below,
                exits: above,
            },
        })
    }
}

/// True at i where `a` moves from at-or-below `b` to strictly above it.
/// Index 0 has no prior bar and is never a cross.
pub fn crossed_above(a: &[f64], b: &[f64]) -> Vec<bool> {
    (0..a.len().min(b.len()))
        .map(|i| i > 0 && a[i] > b[i] && a[i - 1] <= b[i - 1])
        .collect()
}

/// True at i where `a` moves from at-or-above `b` to strictly below it.
pub fn crossed_below(a: &[f64], b: &[f64]) -> Vec<bool> {
    (0..a.len().min(b.len()))
        .map(|i| i > 0 && a[i] < b[i] && a[i - 1] >= b[i - 1])
        .collect()
}
