//! Discrete three-state signal and the external direction label.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Three-state directional signal.
///
/// Used both for the trend filter's output (`TrendState`) and for the fused
/// trade signal (`FusedSignal`); both live in {-1, 0, +1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Short,
    #[default]
    Flat,
    Long,
}

impl Signal {
    pub const ALL: [Signal; 3] = [Signal::Long, Signal::Flat, Signal::Short];

    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }

    /// Signal from the sign of a difference (`-1`, `0`, `+1`).
    pub fn from_diff(diff: i8) -> Self {
        match diff.signum() {
            1 => Signal::Long,
            -1 => Signal::Short,
            _ => Signal::Flat,
        }
    }
}

impl TryFrom<i8> for Signal {
    type Error = CoreError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Short),
            0 => Ok(Signal::Flat),
            1 => Ok(Signal::Long),
            other => Err(CoreError::InvalidInput(format!(
                "signal value {other} is outside {{-1, 0, 1}}"
            ))),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// Per-bar output of a directional classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DirectionLabel {
    Up,
    Down,
}

impl DirectionLabel {
    pub const ALL: [DirectionLabel; 2] = [DirectionLabel::Up, DirectionLabel::Down];
}

impl fmt::Display for DirectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectionLabel::Up => write!(f, "UP"),
            DirectionLabel::Down => write!(f, "DOWN"),
        }
    }
}

impl std::str::FromStr for DirectionLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" | "1" => Ok(DirectionLabel::Up),
            "DOWN" | "0" | "-1" => Ok(DirectionLabel::Down),
            other => Err(CoreError::InvalidInput(format!(
                "unknown direction label '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i8_roundtrip() {
        for s in Signal::ALL {
            assert_eq!(Signal::try_from(s.as_i8()).unwrap(), s);
        }
    }

    #[test]
    fn try_from_rejects_out_of_range() {
        assert!(Signal::try_from(2).is_err());
        assert!(Signal::try_from(-3).is_err());
    }

    #[test]
    fn from_diff_uses_sign() {
        assert_eq!(Signal::from_diff(1), Signal::Long);
        assert_eq!(Signal::from_diff(0), Signal::Flat);
        assert_eq!(Signal::from_diff(-1), Signal::Short);
    }

    #[test]
    fn default_is_flat() {
        assert_eq!(Signal::default(), Signal::Flat);
    }

    #[test]
    fn label_parsing() {
        assert_eq!("UP".parse::<DirectionLabel>().unwrap(), DirectionLabel::Up);
        assert_eq!(" down ".parse::<DirectionLabel>().unwrap(), DirectionLabel::Down);
        assert_eq!("1".parse::<DirectionLabel>().unwrap(), DirectionLabel::Up);
        assert!("sideways".parse::<DirectionLabel>().is_err());
    }

    #[test]
    fn label_serializes_uppercase() {
        let json = serde_json::to_string(&DirectionLabel::Up).unwrap();
        assert_eq!(json, "\"UP\"");
    }
}
