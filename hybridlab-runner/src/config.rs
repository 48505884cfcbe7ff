//! Serializable backtest configuration, loaded from TOML.
//!
//! ```toml
//! [strategy]
//! fast_span = 1
//! slow_span = 5
//! event_source = "fused_signal"
//! classifier = { type = "return_sign" }
//!
//! [[instrument]]
//! symbol = "ES"
//! bars = "data/es_4h.csv"
//! multiplier = 50.0
//! long_slippage = 8.0
//! short_slippage = 7.0
//! initial_capital = 100000.0
//! ```
//!
//! Relative paths resolve against the config file's directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hybridlab_core::domain::DirectionLabel;
use hybridlab_core::engine::{ContractSpec, EventSource, StrategyParams};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors from reading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete run file: one strategy applied to one or more instruments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    pub strategy: StrategyConfig,
    #[serde(rename = "instrument")]
    pub instruments: Vec<InstrumentConfig>,
    /// Directory relative paths resolve against. Not part of the run identity.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Strategy parameters shared by every instrument in the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    pub fast_span: usize,
    pub slow_span: usize,
    #[serde(default = "default_event_source")]
    pub event_source: EventSource,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

fn default_event_source() -> EventSource {
    EventSource::FusedSignal
}

/// Which direction classifier produces the stage-2 labels.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierConfig {
    /// Sign of the smoothed open's percent change.
    #[default]
    ReturnSign,
    /// Same label on every bar.
    Constant { label: DirectionLabel },
    /// Logistic score over (smoothed open, slow EMA).
    Linear { intercept: f64, w_open: f64, w_ema: f64 },
    /// Pre-computed labels from each instrument's `labels` file.
    Labels,
}

/// One instrument: where its bars come from and how it is traded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InstrumentConfig {
    pub symbol: String,
    /// CSV of `timestamp,open,high,low,close`.
    #[serde(default)]
    pub bars: Option<PathBuf>,
    /// Monte Carlo bars fitted on another bar file.
    #[serde(default)]
    pub synthetic: Option<SyntheticSource>,
    /// CSV of `label` or `timestamp,label`, one row per bar.
    #[serde(default)]
    pub labels: Option<PathBuf>,
    pub multiplier: f64,
    #[serde(default = "default_contracts")]
    pub contracts: u32,
    pub long_slippage: f64,
    pub short_slippage: f64,
    pub initial_capital: f64,
}

fn default_contracts() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SyntheticSource {
    /// Bars the return distribution is fitted on.
    pub source: PathBuf,
    pub seed: u64,
    pub count: usize,
}

impl BacktestConfig {
    /// Read, parse, and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// Parse and validate TOML text. Relative paths resolve against the
    /// working directory.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instruments.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[instrument]] is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for inst in &self.instruments {
            if inst.symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("instrument symbol is empty".into()));
            }
            if !seen.insert(inst.symbol.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate instrument symbol '{}'",
                    inst.symbol
                )));
            }
            self.validate_instrument(inst)?;
        }
        Ok(())
    }

    fn validate_instrument(&self, inst: &InstrumentConfig) -> Result<(), ConfigError> {
        let symbol = &inst.symbol;
        match (&inst.bars, &inst.synthetic) {
            (Some(_), None) => {}
            (None, Some(syn)) => {
                if syn.count < 2 {
                    return Err(ConfigError::Invalid(format!(
                        "{symbol}: synthetic count must be >= 2, got {}",
                        syn.count
                    )));
                }
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid(format!(
                    "{symbol}: set either `bars` or `synthetic`, not both"
                )))
            }
            (None, None) => {
                return Err(ConfigError::Invalid(format!(
                    "{symbol}: one of `bars` or `synthetic` is required"
                )))
            }
        }

        if self.strategy.classifier == ClassifierConfig::Labels && inst.labels.is_none() {
            return Err(ConfigError::Invalid(format!(
                "{symbol}: classifier `labels` needs a `labels` file"
            )));
        }

        if !inst.initial_capital.is_finite() || inst.initial_capital <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "{symbol}: initial capital must be positive, got {}",
                inst.initial_capital
            )));
        }

        self.params_for(inst).map(|_| ())
    }

    /// Engine parameters for one instrument.
    pub fn params_for(&self, inst: &InstrumentConfig) -> Result<StrategyParams, ConfigError> {
        let params = StrategyParams {
            fast_span: self.strategy.fast_span,
            slow_span: self.strategy.slow_span,
            long_slippage: inst.long_slippage,
            short_slippage: inst.short_slippage,
            event_source: self.strategy.event_source,
            contract: ContractSpec {
                multiplier: inst.multiplier,
                contracts: inst.contracts,
            },
        };
        params
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("{}: {e}", inst.symbol)))?;
        Ok(params)
    }

    pub fn instrument(&self, symbol: &str) -> Option<&InstrumentConfig> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }

    /// Resolve a config-relative path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs get the same RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("BacktestConfig serialization failed");
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[strategy]
fast_span = 1
slow_span = 5

[[instrument]]
symbol = "ES"
bars = "es.csv"
multiplier = 50.0
long_slippage = 8.0
short_slippage = 7.0
initial_capital = 100000.0

[[instrument]]
symbol = "GE"
synthetic = { source = "ge.csv", seed = 7, count = 500 }
multiplier = 2500.0
long_slippage = 0.0
short_slippage = 0.0
initial_capital = 100000.0
"#;

    #[test]
    fn parses_sample() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.instruments.len(), 2);
        assert_eq!(config.strategy.event_source, EventSource::FusedSignal);
        assert_eq!(config.strategy.classifier, ClassifierConfig::ReturnSign);
        let es = config.instrument("ES").unwrap();
        assert_eq!(es.contracts, 1);
        assert_eq!(es.bars.as_deref(), Some(Path::new("es.csv")));
        let ge = config.instrument("GE").unwrap();
        assert_eq!(ge.synthetic.as_ref().unwrap().seed, 7);
    }

    #[test]
    fn params_carry_per_instrument_slippage() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        let es = config.params_for(config.instrument("ES").unwrap()).unwrap();
        assert_eq!(es.long_slippage, 8.0);
        assert_eq!(es.short_slippage, 7.0);
        assert_eq!(es.contract.multiplier, 50.0);
    }

    #[test]
    fn classifier_variants_parse() {
        let text = SAMPLE.replace(
            "slow_span = 5",
            "slow_span = 5\nevent_source = \"crossover\"\nclassifier = { type = \"constant\", label = \"DOWN\" }",
        );
        let config = BacktestConfig::from_toml(&text).unwrap();
        assert_eq!(config.strategy.event_source, EventSource::Crossover);
        assert_eq!(
            config.strategy.classifier,
            ClassifierConfig::Constant {
                label: DirectionLabel::Down
            }
        );
    }

    #[test]
    fn labels_classifier_requires_label_files() {
        let text = SAMPLE.replace("slow_span = 5", "slow_span = 5\nclassifier = { type = \"labels\" }");
        let err = BacktestConfig::from_toml(&text).unwrap_err();
        assert!(err.to_string().contains("labels"));
    }

    #[test]
    fn rejects_zero_span() {
        let text = SAMPLE.replace("fast_span = 1", "fast_span = 0");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_negative_slippage() {
        let text = SAMPLE.replace("long_slippage = 8.0", "long_slippage = -1.0");
        let err = BacktestConfig::from_toml(&text).unwrap_err();
        assert!(err.to_string().contains("ES"));
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let text = SAMPLE.replace("symbol = \"GE\"", "symbol = \"ES\"");
        let err = BacktestConfig::from_toml(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_missing_data_source() {
        let text = SAMPLE.replace("bars = \"es.csv\"\n", "");
        assert!(BacktestConfig::from_toml(&text).is_err());
    }

    #[test]
    fn rejects_unknown_fields() {
        let text = SAMPLE.replace("fast_span = 1", "fast_span = 1\nwarmup = 10");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_run_id_deterministic() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        let id1 = config.run_id();
        let id2 = config.run_id();
        assert_eq!(id1, id2, "RunId should be deterministic");
        assert_eq!(id1.len(), 64);
    }

    #[test]
    fn test_run_id_changes_with_params() {
        let config1 = BacktestConfig::from_toml(SAMPLE).unwrap();
        let mut config2 = config1.clone();
        config2.strategy.slow_span = 20;
        assert_ne!(config1.run_id(), config2.run_id());
    }

    #[test]
    fn run_id_ignores_base_dir() {
        let config1 = BacktestConfig::from_toml(SAMPLE).unwrap();
        let mut config2 = config1.clone();
        config2.base_dir = PathBuf::from("/elsewhere");
        assert_eq!(config1.run_id(), config2.run_id());
    }

    #[test]
    fn resolves_relative_paths() {
        let mut config = BacktestConfig::from_toml(SAMPLE).unwrap();
        config.base_dir = PathBuf::from("/runs");
        assert_eq!(config.resolve(Path::new("es.csv")), PathBuf::from("/runs/es.csv"));
        assert_eq!(config.resolve(Path::new("/abs.csv")), PathBuf::from("/abs.csv"));
    }
}
