//! End-to-end pipeline: bars in, per-direction trade logs out.
//!
//! Stages, in order:
//! 1. Heikin-Ashi smoothing of the raw bars (skipped by `run_smoothed`)
//! 2. Fast/slow EMA over the smoothed open, trend state with one-bar delay
//! 3. Stage-1 fusion: trend vs the realized direction of the smoothed open
//! 4. Classifier prediction from (smoothed open, slow EMA) features
//! 5. Stage-2 fusion: stage-1 signal vs the prediction
//! 6. Entry/exit streams per direction (fused signal or raw crossover)
//! 7. Long and short simulation at the smoothed open, with per-side slippage
//!
//! Trades execute at the smoothed open of the event bar.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{realized_direction, DirectionClassifier, FeatureRow};
use crate::domain::smoothed::open_series;
use crate::domain::{Bar, Direction, DirectionLabel, Signal, SmoothedBar};
use crate::engine::config::{EventSource, StrategyParams};
use crate::engine::ledger::TradeLog;
use crate::engine::simulator::TradeSimulator;
use crate::error::CoreError;
use crate::indicators::smooth;
use crate::signals::{fuse_two_stage, EventStreams, TrendFilter};

/// Every intermediate series of one run, index-aligned with the input bars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub smoothed: Vec<SmoothedBar>,
    pub fast_ema: Vec<f64>,
    pub slow_ema: Vec<f64>,
    pub trend: Vec<Signal>,
    pub realized: Vec<DirectionLabel>,
    pub predicted: Vec<DirectionLabel>,
    pub momentum_signal: Vec<Signal>,
    pub final_signal: Vec<Signal>,
    pub long: TradeLog,
    pub short: TradeLog,
}

impl PipelineOutput {
    pub fn bar_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Prices the simulator traded at.
    pub fn trade_prices(&self) -> Vec<f64> {
        open_series(&self.smoothed)
    }

    pub fn log(&self, direction: Direction) -> &TradeLog {
        match direction {
            Direction::Long => &self.long,
            Direction::Short => &self.short,
        }
    }
}

/// Configured pipeline. Stateless between runs; safe to share across threads.
#[derive(Debug, Clone)]
pub struct Pipeline {
    params: StrategyParams,
    filter: TrendFilter,
}

impl Pipeline {
    pub fn new(params: StrategyParams) -> Result<Self, CoreError> {
        params.validate()?;
        Ok(Self {
            filter: TrendFilter::new(params.fast_span, params.slow_span)?,
            params,
        })
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Run on raw bars: Heikin-Ashi smoothing first, then every later stage.
    pub fn run(
        &self,
        bars: &[Bar],
        classifier: &dyn DirectionClassifier,
    ) -> Result<PipelineOutput, CoreError> {
        require_bars(bars.len())?;
        self.run_smoothed(smooth(bars)?, classifier)
    }

    /// Run on bars that are already on the smoothed scale, such as a Monte
    /// Carlo path fitted on smoothed opens. Smoothing is skipped and the
    /// bars' opens are the traded prices.
    pub fn run_smoothed(
        &self,
        smoothed: Vec<SmoothedBar>,
        classifier: &dyn DirectionClassifier,
    ) -> Result<PipelineOutput, CoreError> {
        require_bars(smoothed.len())?;
        let prices = open_series(&smoothed);

        let (fast_ema, slow_ema) = self.filter.emas(&prices)?;
        let trend = self.filter.trend(&prices)?;
        let realized = realized_direction(&prices);

        let features: Vec<FeatureRow> = prices
            .iter()
            .zip(&slow_ema)
            .map(|(&smoothed_open, &slow_ema)| FeatureRow {
                smoothed_open,
                slow_ema,
            })
            .collect();
        let predicted = classifier.predict(&features);
        if predicted.len() != prices.len() {
            return Err(CoreError::length_mismatch(
                &format!("{} predictions", classifier.name()),
                prices.len(),
                predicted.len(),
            ));
        }
        let (momentum_signal, final_signal) = fuse_two_stage(&trend, &realized, &predicted)?;

        let long = self.simulate_direction(Direction::Long, &prices, &fast_ema, &slow_ema, &final_signal)?;
        let short = self.simulate_direction(Direction::Short, &prices, &fast_ema, &slow_ema, &final_signal)?;

        debug!(
            bars = prices.len(),
            classifier = classifier.name(),
            long_trades = long.len(),
            short_trades = short.len(),
            "pipeline complete"
        );

        Ok(PipelineOutput {
            smoothed,
            fast_ema,
            slow_ema,
            trend,
            realized,
            predicted,
            momentum_signal,
            final_signal,
            long,
            short,
        })
    }

    fn simulate_direction(
        &self,
        direction: Direction,
        prices: &[f64],
        fast_ema: &[f64],
        slow_ema: &[f64],
        final_signal: &[Signal],
    ) -> Result<TradeLog, CoreError> {
        let events = match self.params.event_source {
            EventSource::FusedSignal => EventStreams::from_signals(final_signal, direction),
            EventSource::Crossover => EventStreams::from_crossover(fast_ema, slow_ema, direction)?,
        };
        debug!(
            %direction,
            entries = events.entry_count(),
            exits = events.exit_count(),
            "event streams"
        );
        let trades = TradeSimulator::new(direction).run(prices, &events)?;
        Ok(TradeLog::new(direction, self.params.slippage(direction), &trades))
    }
}

fn require_bars(len: usize) -> Result<(), CoreError> {
    if len < 2 {
        return Err(CoreError::InsufficientData(format!(
            "need at least 2 bars, got {len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ConstantClassifier, FixedLabels, ReturnSignClassifier};
    use crate::engine::config::ContractSpec;
    use crate::indicators::make_bars;

    fn params(event_source: EventSource) -> StrategyParams {
        StrategyParams {
            fast_span: 1,
            slow_span: 5,
            long_slippage: 0.0,
            short_slippage: 0.0,
            event_source,
            contract: ContractSpec::new(50.0, 1).unwrap(),
        }
    }

    fn zigzag() -> Vec<Bar> {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + 10.0 * ((i as f64) * 0.35).sin())
            .collect();
        make_bars(&closes)
    }

    #[test]
    fn rejects_single_bar() {
        let pipeline = Pipeline::new(params(EventSource::FusedSignal)).unwrap();
        let err = pipeline.run(&make_bars(&[100.0]), &ReturnSignClassifier).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData(_)));
    }

    #[test]
    fn rejects_invalid_params() {
        let mut p = params(EventSource::FusedSignal);
        p.long_slippage = -1.0;
        assert!(matches!(Pipeline::new(p), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn outputs_are_index_aligned() {
        let bars = zigzag();
        let out = Pipeline::new(params(EventSource::FusedSignal))
            .unwrap()
            .run(&bars, &ReturnSignClassifier)
            .unwrap();
        let n = bars.len();
        assert_eq!(out.bar_count(), n);
        assert_eq!(out.fast_ema.len(), n);
        assert_eq!(out.slow_ema.len(), n);
        assert_eq!(out.trend.len(), n);
        assert_eq!(out.realized.len(), n);
        assert_eq!(out.predicted.len(), n);
        assert_eq!(out.final_signal.len(), n);
    }

    #[test]
    fn fast_span_1_equals_smoothed_open() {
        let bars = zigzag();
        let out = Pipeline::new(params(EventSource::FusedSignal))
            .unwrap()
            .run(&bars, &ReturnSignClassifier)
            .unwrap();
        assert_eq!(out.fast_ema, out.trade_prices());
    }

    #[test]
    fn disagreeing_classifier_blocks_longs() {
        let bars = zigzag();
        let out = Pipeline::new(params(EventSource::FusedSignal))
            .unwrap()
            .run(&bars, &ConstantClassifier(DirectionLabel::Down))
            .unwrap();
        assert!(out.final_signal.iter().all(|&s| s != Signal::Long));
        assert!(out.long.is_empty());
    }

    #[test]
    fn short_prediction_list_is_rejected() {
        let bars = zigzag();
        let labels = FixedLabels::new(vec![DirectionLabel::Up; 3]);
        let err = Pipeline::new(params(EventSource::FusedSignal))
            .unwrap()
            .run(&bars, &labels)
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData(_)));
    }

    #[test]
    fn run_smoothed_trades_at_given_opens() {
        let path: Vec<f64> = (0..40)
            .map(|i| 100.0 + 8.0 * ((i as f64) * 0.45).sin())
            .collect();
        let flat: Vec<SmoothedBar> = make_bars(&path)
            .into_iter()
            .zip(&path)
            .map(|(b, &p)| SmoothedBar::from(Bar::new(b.timestamp, p, p, p, p)))
            .collect();
        let pipeline = Pipeline::new(params(EventSource::Crossover)).unwrap();
        let out = pipeline.run_smoothed(flat, &ReturnSignClassifier).unwrap();
        assert_eq!(out.trade_prices(), path);
        assert!(!out.long.is_empty());
        for t in &out.long.trades {
            assert_eq!(t.trade.entry_price, path[t.trade.entry_index]);
            assert_eq!(t.trade.exit_price, path[t.trade.exit_index]);
        }
    }

    #[test]
    fn run_smoothed_rejects_single_bar() {
        let one = SmoothedBar::from(make_bars(&[100.0])[0]);
        let err = Pipeline::new(params(EventSource::FusedSignal))
            .unwrap()
            .run_smoothed(vec![one], &ReturnSignClassifier)
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData(_)));
    }

    #[test]
    fn crossover_source_ignores_classifier() {
        let bars = zigzag();
        let pipeline = Pipeline::new(params(EventSource::Crossover)).unwrap();
        let up = pipeline.run(&bars, &ConstantClassifier(DirectionLabel::Up)).unwrap();
        let down = pipeline.run(&bars, &ConstantClassifier(DirectionLabel::Down)).unwrap();
        assert_eq!(up.long, down.long);
        assert_eq!(up.short, down.short);
        assert!(!up.long.is_empty());
    }
}
