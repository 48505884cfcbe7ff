//! Directional classifier contract and deterministic implementations.
//!
//! The engine only consumes the classifier's per-bar UP/DOWN output. Model
//! training lives outside this crate; implementations here are either rules
//! (`ReturnSignClassifier`, `ConstantClassifier`), precomputed predictions
//! (`FixedLabels`), or inference with caller-supplied coefficients
//! (`LinearClassifier`).

use serde::{Deserialize, Serialize};

use crate::domain::DirectionLabel;
use crate::indicators::pct_change;

/// Model inputs for one bar: the smoothed open and its slow EMA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub smoothed_open: f64,
    pub slow_ema: f64,
}

/// Produces one DirectionLabel per feature row, index-aligned.
///
/// Implementations must not look at rows after the one being labeled, except
/// where they deliberately replay precomputed output (`FixedLabels`).
pub trait DirectionClassifier: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, features: &[FeatureRow]) -> Vec<DirectionLabel>;
}

/// Label each bar by the sign of the percent change of a price series.
///
/// UP where the change from the previous bar is strictly positive. Index 0
/// has no prior bar and is labeled DOWN.
pub fn realized_direction(prices: &[f64]) -> Vec<DirectionLabel> {
    pct_change(prices)
        .into_iter()
        .map(|r| match r {
            Some(r) if r > 0.0 => DirectionLabel::Up,
            _ => DirectionLabel::Down,
        })
        .collect()
}

/// Labels from the realized direction of the smoothed open.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnSignClassifier;

impl DirectionClassifier for ReturnSignClassifier {
    fn name(&self) -> &str {
        "return_sign"
    }

    fn predict(&self, features: &[FeatureRow]) -> Vec<DirectionLabel> {
        let opens: Vec<f64> = features.iter().map(|f| f.smoothed_open).collect();
        realized_direction(&opens)
    }
}

/// Always predicts the same label.
#[derive(Debug, Clone, Copy)]
pub struct ConstantClassifier(pub DirectionLabel);

impl DirectionClassifier for ConstantClassifier {
    fn name(&self) -> &str {
        "constant"
    }

    fn predict(&self, features: &[FeatureRow]) -> Vec<DirectionLabel> {
        vec![self.0; features.len()]
    }
}

/// Replays labels produced elsewhere (e.g. loaded from a file).
///
/// Returns the stored labels regardless of the features; the caller checks
/// that the lengths line up.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedLabels {
    labels: Vec<DirectionLabel>,
}

impl FixedLabels {
    pub fn new(labels: Vec<DirectionLabel>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[DirectionLabel] {
        &self.labels
    }
}

impl DirectionClassifier for FixedLabels {
    fn name(&self) -> &str {
        "fixed_labels"
    }

    fn predict(&self, _features: &[FeatureRow]) -> Vec<DirectionLabel> {
        self.labels.clone()
    }
}

/// Logistic scorer with fixed coefficients.
///
/// P(UP) = sigmoid(intercept + w_open * smoothed_open + w_ema * slow_ema).
/// Predicts UP when P(UP) > 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub intercept: f64,
    pub w_open: f64,
    pub w_ema: f64,
}

impl LinearClassifier {
    pub fn probability_up(&self, row: &FeatureRow) -> f64 {
        let z = self.intercept + self.w_open * row.smoothed_open + self.w_ema * row.slow_ema;
        1.0 / (1.0 + (-z).exp())
    }
}

impl DirectionClassifier for LinearClassifier {
    fn name(&self) -> &str {
        "linear"
    }

    fn predict(&self, features: &[FeatureRow]) -> Vec<DirectionLabel> {
        features
            .iter()
            .map(|row| {
                if self.probability_up(row) > 0.5 {
                    DirectionLabel::Up
                } else {
                    DirectionLabel::Down
                }
            })
            .collect()
    }
}
