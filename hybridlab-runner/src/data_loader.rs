//! Bar and label loading for the runner.
//!
//! Each instrument resolves to one bar sequence:
//! 1. `bars = "file.csv"` → read the CSV as-is
//! 2. `synthetic = {...}` → fit log-return stats on the source file's smoothed
//!    open and draw a seeded Monte Carlo path (tagged as synthetic). The path
//!    is already on the smoothed scale and bypasses Heikin-Ashi in the runner.
//!
//! Results produced on synthetic data carry `has_synthetic = true` all the way
//! into the exported manifest.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use hybridlab_core::domain::smoothed::open_series;
use hybridlab_core::domain::{validate_bars, Bar, DirectionLabel};
use hybridlab_core::indicators::smooth;
use hybridlab_core::synthetic::{LogReturnStats, MonteCarloGenerator, SeriesGenerator};
use hybridlab_core::CoreError;

use crate::config::{BacktestConfig, InstrumentConfig, SyntheticSource};

/// Timestamp format written to CSV.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("{0}")]
    Core(#[from] CoreError),
}

impl LoadError {
    fn csv(path: &Path, source: csv::Error) -> Self {
        LoadError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    fn invalid(path: &Path, message: impl Into<String>) -> Self {
        LoadError::Invalid {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Bars for one instrument plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bars: Vec<Bar>,
    /// BLAKE3 over every bar's timestamp and OHLC values.
    pub dataset_hash: String,
    pub has_synthetic: bool,
    /// Bars are already smoothed opens and must not be smoothed again.
    pub presmoothed: bool,
    /// Bars whose OHLC range is inverted. Kept, but reported.
    pub data_quality_warnings: Vec<String>,
}

impl LoadedData {
    /// Raw market bars.
    pub fn new(bars: Vec<Bar>) -> Self {
        Self::build(bars, false)
    }

    /// A Monte Carlo path on the smoothed-open scale.
    pub fn synthetic(bars: Vec<Bar>) -> Self {
        Self::build(bars, true)
    }

    fn build(bars: Vec<Bar>, synthetic: bool) -> Self {
        let data_quality_warnings = bars
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_sane())
            .map(|(i, b)| format!("bar {i} ({}) has an inverted OHLC range", b.timestamp))
            .collect();
        Self {
            dataset_hash: dataset_hash(&bars),
            bars,
            has_synthetic: synthetic,
            presmoothed: synthetic,
            data_quality_warnings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BarRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

/// Load the bars an instrument config points at.
pub fn load_instrument(config: &BacktestConfig, inst: &InstrumentConfig) -> Result<LoadedData, LoadError> {
    if let Some(syn) = &inst.synthetic {
        warn!(
            symbol = %inst.symbol,
            "generating synthetic data; results will be tagged as synthetic"
        );
        let source = load_bars_csv(&config.resolve(&syn.source))?;
        let bars = synthesize(&source, syn)?;
        return Ok(LoadedData::synthetic(bars));
    }

    let path = inst.bars.as_deref().ok_or_else(|| {
        LoadError::invalid(Path::new(&inst.symbol), "instrument has no bar source")
    })?;
    let bars = load_bars_csv(&config.resolve(path))?;
    Ok(LoadedData::new(bars))
}

/// Read a `timestamp,open,high,low,close` CSV and validate the sequence.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| LoadError::csv(path, e))?;
    let mut bars = Vec::new();
    for (row, record) in reader.deserialize::<BarRow>().enumerate() {
        let r = record.map_err(|e| LoadError::csv(path, e))?;
        let timestamp = parse_timestamp(&r.timestamp).ok_or_else(|| {
            LoadError::invalid(path, format!("row {}: bad timestamp '{}'", row + 1, r.timestamp))
        })?;
        bars.push(Bar::new(timestamp, r.open, r.high, r.low, r.close));
    }
    validate_bars(&bars).map_err(|e| LoadError::invalid(path, e.to_string()))?;
    debug!(path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}

/// Write bars as `timestamp,open,high,low,close`.
pub fn write_bars_csv(path: &Path, bars: &[Bar]) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| LoadError::csv(path, e))?;
    for b in bars {
        writer
            .serialize(BarRow {
                timestamp: b.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
            })
            .map_err(|e| LoadError::csv(path, e))?;
    }
    writer
        .flush()
        .map_err(|e| LoadError::csv(path, csv::Error::from(e)))
}

/// Labels read from a CSV, optionally keyed by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSeries {
    pub timestamps: Option<Vec<NaiveDateTime>>,
    pub labels: Vec<DirectionLabel>,
}

impl LabelSeries {
    /// Check the labels line up with `bars` and return them index-aligned.
    pub fn align(self, bars: &[Bar], path: &Path) -> Result<Vec<DirectionLabel>, LoadError> {
        if self.labels.len() != bars.len() {
            return Err(LoadError::invalid(
                path,
                format!("{} labels for {} bars", self.labels.len(), bars.len()),
            ));
        }
        if let Some(ts) = &self.timestamps {
            if let Some(i) = ts.iter().zip(bars).position(|(t, b)| *t != b.timestamp) {
                return Err(LoadError::invalid(
                    path,
                    format!(
                        "label row {} is for {} but bar {i} is {}",
                        i + 1,
                        ts[i],
                        bars[i].timestamp
                    ),
                ));
            }
        }
        Ok(self.labels)
    }
}

/// Read a `label` or `timestamp,label` CSV.
pub fn load_labels_csv(path: &Path) -> Result<LabelSeries, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| LoadError::csv(path, e))?;
    let headers = reader.headers().map_err(|e| LoadError::csv(path, e))?.clone();
    let label_col = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("label"))
        .ok_or_else(|| LoadError::invalid(path, "missing `label` column"))?;
    let ts_col = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("timestamp"));

    let mut labels = Vec::new();
    let mut timestamps = ts_col.map(|_| Vec::new());
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| LoadError::csv(path, e))?;
        let raw = record.get(label_col).unwrap_or_default();
        let label = raw
            .parse::<DirectionLabel>()
            .map_err(|e| LoadError::invalid(path, format!("row {}: {e}", row + 1)))?;
        labels.push(label);

        if let (Some(col), Some(ts)) = (ts_col, timestamps.as_mut()) {
            let raw = record.get(col).unwrap_or_default();
            let t = parse_timestamp(raw).ok_or_else(|| {
                LoadError::invalid(path, format!("row {}: bad timestamp '{raw}'", row + 1))
            })?;
            ts.push(t);
        }
    }
    Ok(LabelSeries { timestamps, labels })
}

/// Parse `YYYY-MM-DD HH:MM:SS`, the `T`-separated ISO form, or a bare date.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Monte Carlo bars continuing from `source`.
///
/// Stats are fitted on the smoothed open; the path starts at the last smoothed
/// open and one source bar interval after the last source timestamp.
pub fn synthesize(source: &[Bar], syn: &SyntheticSource) -> Result<Vec<Bar>, LoadError> {
    let generator = monte_carlo_from(source, syn.seed)?;
    Ok(generator.generate(syn.count)?)
}

/// Build a generator fitted on `source`. Needs at least 3 bars.
pub fn monte_carlo_from(source: &[Bar], seed: u64) -> Result<MonteCarloGenerator, LoadError> {
    let smoothed = smooth(source)?;
    let opens = open_series(&smoothed);
    let stats = LogReturnStats::from_prices(&opens)?;

    let (prev, last) = match source {
        [.., prev, last] => (prev, last),
        _ => {
            return Err(CoreError::InsufficientData("need at least 2 source bars".into()).into())
        }
    };
    let step = last.timestamp - prev.timestamp;
    let initial_price = opens.last().copied().unwrap_or(last.open);

    debug!(
        mean = stats.mean,
        std_dev = stats.std_dev,
        samples = stats.sample_count,
        initial_price,
        "fitted log-return stats"
    );

    Ok(MonteCarloGenerator {
        stats,
        initial_price,
        seed,
        start: last.timestamp + step,
        step,
    })
}

/// Content hash over the bar sequence.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for b in bars {
        hasher.update(&b.timestamp.and_utc().timestamp().to_le_bytes());
        for v in [b.open, b.high, b.low, b.close] {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
