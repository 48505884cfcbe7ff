//! HybridLab Runner — backtest orchestration, metrics, and artifacts.
//!
//! This crate builds on `hybridlab-core` to provide:
//! - TOML run configuration with validation and content-addressed run IDs
//! - Bar and label loading from CSV, with Monte Carlo synthetic fallback
//! - Per-instrument runner with parallel fan-out and failure isolation
//! - Per-direction trade statistics and a buy-and-hold benchmark
//! - JSON, CSV, and Markdown artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, ClassifierConfig, ConfigError, InstrumentConfig, RunId, StrategyConfig, SyntheticSource};
pub use data_loader::{load_bars_csv, load_instrument, load_labels_csv, write_bars_csv, LoadError, LoadedData};
pub use export::{
    export_bar_equity_csv, export_json, generate_report, import_json, load_artifacts, save_artifacts,
};
pub use metrics::{BuyAndHold, TradeStats};
pub use runner::{
    build_classifier, run_all, run_backtest_from_data, run_instrument, BacktestResult, BarEquity, InstrumentRun,
    RunError, TradeRecord, SCHEMA_VERSION,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn trade_stats_is_send_sync() {
        assert_send::<TradeStats>();
        assert_sync::<TradeStats>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<InstrumentConfig>();
        assert_sync::<InstrumentConfig>();
    }

    #[test]
    fn loaded_data_is_send_sync() {
        assert_send::<LoadedData>();
        assert_sync::<LoadedData>();
    }

    #[test]
    fn run_error_is_send() {
        assert_send::<RunError>();
        assert_send::<InstrumentRun>();
    }
}
