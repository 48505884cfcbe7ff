//! HybridLab CLI — run, simulate, and validate commands.
//!
//! Commands:
//! - `run` — execute every instrument in a TOML config and save artifacts
//! - `simulate` — write Monte Carlo bars fitted on an existing bar file
//! - `validate` — parse and validate a config without running it

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

use hybridlab_core::domain::Direction;
use hybridlab_runner::data_loader::synthesize;
use hybridlab_runner::{
    load_bars_csv, run_all, save_artifacts, write_bars_csv, BacktestConfig, BacktestResult,
    SyntheticSource,
};

#[derive(Parser)]
#[command(
    name = "hybridlab",
    about = "HybridLab CLI — Heikin-Ashi momentum and classifier fusion backtester"
)]
struct Cli {
    /// Log at DEBUG instead of INFO.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for result artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Generate synthetic bars from the return distribution of a bar file.
    Simulate {
        /// Source bars CSV (timestamp,open,high,low,close).
        #[arg(long)]
        bars: PathBuf,

        /// Number of bars to generate.
        #[arg(long, default_value_t = 1000)]
        count: usize,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,
    },
    /// Parse and validate a config file without running it.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { config, output_dir } => run_backtest_cmd(config, output_dir),
        Commands::Simulate {
            bars,
            count,
            seed,
            out,
        } => run_simulate(bars, count, seed, out),
        Commands::Validate { config } => run_validate(config),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            Targets::new()
                .with_target("hybridlab_core", level)
                .with_target("hybridlab_runner", level)
                .with_default(Level::WARN),
        );
    tracing_subscriber::registry().with(fmt_layer).init();
}

fn run_backtest_cmd(config_path: PathBuf, output_dir: PathBuf) -> Result<()> {
    let config = BacktestConfig::from_file(&config_path)?;
    tracing::info!(
        run_id = %config.run_id(),
        instruments = config.instruments.len(),
        "starting run"
    );

    let mut failed = Vec::new();
    for run in run_all(&config) {
        match run.outcome {
            Ok(result) => {
                print_summary(&result);
                let run_dir = save_artifacts(&result, &output_dir)?;
                println!("Artifacts saved to: {}", run_dir.display());
            }
            Err(e) => {
                eprintln!("Error for {}: {e}", run.symbol);
                failed.push(run.symbol);
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} instrument(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

fn run_simulate(bars: PathBuf, count: usize, seed: u64, out: PathBuf) -> Result<()> {
    if count < 2 {
        bail!("--count must be at least 2");
    }
    let source = load_bars_csv(&bars)?;
    let synthetic = synthesize(
        &source,
        &SyntheticSource {
            source: bars.clone(),
            seed,
            count,
        },
    )?;
    write_bars_csv(&out, &synthetic)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!(
        "Wrote {} synthetic bars (seed {seed}) fitted on {} to {}",
        synthetic.len(),
        bars.display(),
        out.display()
    );
    Ok(())
}

fn run_validate(config_path: PathBuf) -> Result<()> {
    let config = BacktestConfig::from_file(&config_path)?;
    println!("Config OK: {}", config_path.display());
    println!("Run ID:         {}", config.run_id());
    println!(
        "Strategy:       EMA {}/{}, {:?}, {:?}",
        config.strategy.fast_span,
        config.strategy.slow_span,
        config.strategy.event_source,
        config.strategy.classifier
    );
    for inst in &config.instruments {
        println!(
            "Instrument:     {} (x{} @ ${}/pt, slippage {}/{})",
            inst.symbol, inst.contracts, inst.multiplier, inst.long_slippage, inst.short_slippage
        );
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", result.symbol);
    println!("Period:         {} to {}", result.start, result.end);
    println!("Bars:           {}", result.bar_count);
    println!("Signals:        {}", result.signal_count);
    println!("Classifier:     {}", result.classifier);
    for direction in [Direction::Long, Direction::Short] {
        let s = result.stats(direction);
        println!();
        println!("--- {direction} ---");
        println!("Trades:         {}", s.trade_count);
        println!("Total Points:   {:.2}", s.total_points);
        if let Some(mean) = s.mean_points {
            println!("Mean Points:    {mean:.2}");
        }
        if let Some(std) = s.std_points {
            println!("Std Points:     {std:.2}");
        }
        if let (Some(min), Some(max)) = (s.min_points, s.max_points) {
            println!("Worst / Best:   {min:.2} / {max:.2}");
        }
        if let Some(win) = s.win_rate {
            println!("Win Rate:       {:.1}%", win * 100.0);
        }
        println!("Max Drawdown:   {:.2} pts", s.max_drawdown_points);
        println!("Total $:        {:.2}", s.total_usd);
        println!("Return:         {:.2}%", s.pct_return);
    }
    if let Some(bh) = &result.buy_and_hold {
        println!();
        println!("--- Buy & Hold ---");
        println!("Total $:        {:.2}", bh.total_usd);
        println!("Return:         {:.2}%", bh.pct_return);
    }
    if result.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for warn in &result.data_quality_warnings {
        println!("WARNING: {warn}");
    }
    println!();
}
