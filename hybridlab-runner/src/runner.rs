//! Backtest runner — wires config, data, classifier, pipeline, and metrics.
//!
//! Three entry points:
//! - `run_all()`: every instrument in a config, in parallel. Used by the CLI.
//! - `run_instrument()`: one instrument; loads its bars and labels.
//! - `run_backtest_from_data()`: pre-loaded bars and a ready classifier, no I/O.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use hybridlab_core::classifier::{
    ConstantClassifier, DirectionClassifier, FixedLabels, LinearClassifier, ReturnSignClassifier,
};
use hybridlab_core::domain::{AdjustedTrade, Direction, Signal, SmoothedBar};
use hybridlab_core::engine::{ContractSpec, Pipeline, PipelineOutput, StrategyParams, TradeLog};
use hybridlab_core::CoreError;

use crate::config::{BacktestConfig, ClassifierConfig, ConfigError, InstrumentConfig};
use crate::data_loader::{load_instrument, load_labels_csv, LoadError, LoadedData};
use crate::metrics::{BuyAndHold, TradeStats};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] CoreError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// One completed trade with bar timestamps and dollar amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub direction: Direction,
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub entry_price_adj: f64,
    pub exit_bar: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_price_adj: f64,
    pub bars_held: usize,
    pub pnl_points: f64,
    pub cumulative_points: f64,
    pub pnl_usd: f64,
    pub cumulative_usd: f64,
}

impl TradeRecord {
    fn from_adjusted(t: &AdjustedTrade, timestamps: &[NaiveDateTime], contract: &ContractSpec) -> Self {
        Self {
            direction: t.trade.direction,
            entry_bar: t.trade.entry_index,
            entry_time: timestamps[t.trade.entry_index],
            entry_price: t.trade.entry_price,
            entry_price_adj: t.entry_price_adj,
            exit_bar: t.trade.exit_index,
            exit_time: timestamps[t.trade.exit_index],
            exit_price: t.trade.exit_price,
            exit_price_adj: t.exit_price_adj,
            bars_held: t.trade.bars_held(),
            pnl_points: t.pnl,
            cumulative_points: t.cumulative_pnl,
            pnl_usd: contract.dollarize(t.pnl),
            cumulative_usd: contract.dollarize(t.cumulative_pnl),
        }
    }
}

/// Realized equity at one bar. Steps on each exit bar; open positions are
/// not marked to market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarEquity {
    pub bar: usize,
    pub timestamp: NaiveDateTime,
    pub long_points: f64,
    pub short_points: f64,
    /// Initial capital plus both directions' realized dollars.
    pub equity: f64,
}

fn equity_by_bar(
    output: &PipelineOutput,
    timestamps: &[NaiveDateTime],
    contract: &ContractSpec,
    initial_capital: f64,
) -> Vec<BarEquity> {
    let long = output.long.equity_by_bar(timestamps.len());
    let short = output.short.equity_by_bar(timestamps.len());
    timestamps
        .iter()
        .zip(long.iter().zip(&short))
        .enumerate()
        .map(|(bar, (&timestamp, (&long_points, &short_points)))| BarEquity {
            bar,
            timestamp,
            long_points,
            short_points,
            equity: initial_capital + contract.dollarize(long_points) + contract.dollarize(short_points),
        })
        .collect()
}

/// Complete result of one instrument's backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub symbol: String,
    pub params: StrategyParams,
    pub classifier: String,
    pub start: String,
    pub end: String,
    pub initial_capital: f64,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub bar_count: usize,
    /// Bars where the final fused signal is non-flat.
    pub signal_count: usize,
    pub data_quality_warnings: Vec<String>,
    pub long_trades: Vec<TradeRecord>,
    pub short_trades: Vec<TradeRecord>,
    pub long_stats: TradeStats,
    pub short_stats: TradeStats,
    /// Per-bar realized equity, index-aligned with the bars.
    #[serde(default)]
    pub equity_by_bar: Vec<BarEquity>,
    /// `None` only for an empty bar series, which the pipeline rejects.
    pub buy_and_hold: Option<BuyAndHold>,
}

impl BacktestResult {
    pub fn trades(&self, direction: Direction) -> &[TradeRecord] {
        match direction {
            Direction::Long => &self.long_trades,
            Direction::Short => &self.short_trades,
        }
    }

    pub fn stats(&self, direction: Direction) -> &TradeStats {
        match direction {
            Direction::Long => &self.long_stats,
            Direction::Short => &self.short_stats,
        }
    }

    /// Long plus short dollars.
    pub fn combined_usd(&self) -> f64 {
        self.long_stats.total_usd + self.short_stats.total_usd
    }
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Outcome for one instrument of a multi-instrument run.
#[derive(Debug)]
pub struct InstrumentRun {
    pub symbol: String,
    pub outcome: Result<BacktestResult, RunError>,
}

/// Run every instrument in parallel. A failing instrument is logged and
/// reported in its slot; the others still complete.
pub fn run_all(config: &BacktestConfig) -> Vec<InstrumentRun> {
    config
        .instruments
        .par_iter()
        .map(|inst| {
            let outcome = run_instrument(config, inst);
            match &outcome {
                Ok(r) => info!(
                    symbol = %r.symbol,
                    bars = r.bar_count,
                    long_trades = r.long_stats.trade_count,
                    short_trades = r.short_stats.trade_count,
                    combined_usd = r.combined_usd(),
                    "backtest complete"
                ),
                Err(e) => warn!(symbol = %inst.symbol, error = %e, "backtest failed"),
            }
            InstrumentRun {
                symbol: inst.symbol.clone(),
                outcome,
            }
        })
        .collect()
}

/// Run a single instrument from a validated config.
pub fn run_instrument(
    config: &BacktestConfig,
    inst: &InstrumentConfig,
) -> Result<BacktestResult, RunError> {
    let params = config.params_for(inst)?;
    let data = load_instrument(config, inst)?;
    for w in &data.data_quality_warnings {
        warn!(symbol = %inst.symbol, "{w}");
    }
    let classifier = build_classifier(config, inst, &data)?;
    run_backtest_from_data(
        &params,
        classifier.as_ref(),
        &data,
        &inst.symbol,
        inst.initial_capital,
        &config.run_id(),
    )
}

/// Build the configured classifier for one instrument.
///
/// The `labels` variant reads the instrument's label file and checks it
/// against the loaded bars.
pub fn build_classifier(
    config: &BacktestConfig,
    inst: &InstrumentConfig,
    data: &LoadedData,
) -> Result<Box<dyn DirectionClassifier>, RunError> {
    Ok(match &config.strategy.classifier {
        ClassifierConfig::ReturnSign => Box::new(ReturnSignClassifier),
        ClassifierConfig::Constant { label } => Box::new(ConstantClassifier(*label)),
        ClassifierConfig::Linear {
            intercept,
            w_open,
            w_ema,
        } => Box::new(LinearClassifier {
            intercept: *intercept,
            w_open: *w_open,
            w_ema: *w_ema,
        }),
        ClassifierConfig::Labels => {
            let path = inst.labels.as_deref().ok_or_else(|| {
                ConfigError::Invalid(format!("{}: no labels file", inst.symbol))
            })?;
            let path = config.resolve(path);
            let labels = load_labels_csv(&path)?.align(&data.bars, &path)?;
            Box::new(FixedLabels::new(labels))
        }
    })
}

/// Run the pipeline on pre-loaded bars — no I/O.
///
/// Presmoothed (synthetic) bars skip Heikin-Ashi and trade at their own opens.
pub fn run_backtest_from_data(
    params: &StrategyParams,
    classifier: &dyn DirectionClassifier,
    data: &LoadedData,
    symbol: &str,
    initial_capital: f64,
    run_id: &str,
) -> Result<BacktestResult, RunError> {
    let pipeline = Pipeline::new(*params)?;
    let output = if data.presmoothed {
        let smoothed: Vec<SmoothedBar> = data.bars.iter().copied().map(SmoothedBar::from).collect();
        pipeline.run_smoothed(smoothed, classifier)?
    } else {
        pipeline.run(&data.bars, classifier)?
    };
    let timestamps: Vec<NaiveDateTime> = data.bars.iter().map(|b| b.timestamp).collect();
    let contract = &params.contract;

    let records = |log: &TradeLog| -> Vec<TradeRecord> {
        log.trades
            .iter()
            .map(|t| TradeRecord::from_adjusted(t, &timestamps, contract))
            .collect()
    };

    let start = timestamps.first().map(|t| t.to_string()).unwrap_or_default();
    let end = timestamps.last().map(|t| t.to_string()).unwrap_or_default();

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: run_id.to_string(),
        symbol: symbol.to_string(),
        params: *params,
        classifier: classifier.name().to_string(),
        start,
        end,
        initial_capital,
        dataset_hash: data.dataset_hash.clone(),
        has_synthetic: data.has_synthetic,
        bar_count: output.bar_count(),
        signal_count: output
            .final_signal
            .iter()
            .filter(|&&s| s != Signal::Flat)
            .count(),
        data_quality_warnings: data.data_quality_warnings.clone(),
        long_trades: records(&output.long),
        short_trades: records(&output.short),
        long_stats: TradeStats::compute(&output.long, contract, initial_capital),
        short_stats: TradeStats::compute(&output.short, contract, initial_capital),
        equity_by_bar: equity_by_bar(&output, &timestamps, contract, initial_capital),
        buy_and_hold: BuyAndHold::compute(&data.bars, contract, initial_capital),
    })
}
