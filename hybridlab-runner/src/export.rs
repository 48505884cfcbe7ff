//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for backtest results:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: per-direction trade tapes, per-trade and per-bar equity curves
//! - **Markdown**: human-readable single-run report
//!
//! All persisted artifacts include a `schema_version` field. Unknown versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use hybridlab_core::domain::Direction;

use crate::data_loader::TIMESTAMP_FORMAT;
use crate::runner::{BacktestResult, BarEquity, TradeRecord, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade list as CSV.
///
/// Columns: direction, entry_bar, entry_time, entry_price, entry_price_adj,
/// exit_bar, exit_time, exit_price, exit_price_adj, bars_held, pnl_points,
/// cumulative_points, pnl_usd, cumulative_usd
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "direction",
        "entry_bar",
        "entry_time",
        "entry_price",
        "entry_price_adj",
        "exit_bar",
        "exit_time",
        "exit_price",
        "exit_price_adj",
        "bars_held",
        "pnl_points",
        "cumulative_points",
        "pnl_usd",
        "cumulative_usd",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.direction.to_string(),
            &t.entry_bar.to_string(),
            &t.entry_time.format(TIMESTAMP_FORMAT).to_string(),
            &format!("{:.6}", t.entry_price),
            &format!("{:.6}", t.entry_price_adj),
            &t.exit_bar.to_string(),
            &t.exit_time.format(TIMESTAMP_FORMAT).to_string(),
            &format!("{:.6}", t.exit_price),
            &format!("{:.6}", t.exit_price_adj),
            &t.bars_held.to_string(),
            &format!("{:.6}", t.pnl_points),
            &format!("{:.6}", t.cumulative_points),
            &format!("{:.2}", t.pnl_usd),
            &format!("{:.2}", t.cumulative_usd),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the per-trade equity curve: account value after each exit.
///
/// The first row is the starting capital at bar 0.
pub fn export_equity_csv(trades: &[TradeRecord], initial_capital: f64) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["trade", "exit_bar", "exit_time", "cumulative_points", "equity"])?;
    wtr.write_record(["0", "0", "", "0.000000", &format!("{:.2}", initial_capital)])?;
    for (i, t) in trades.iter().enumerate() {
        wtr.write_record([
            &(i + 1).to_string(),
            &t.exit_bar.to_string(),
            &t.exit_time.format(TIMESTAMP_FORMAT).to_string(),
            &format!("{:.6}", t.cumulative_points),
            &format!("{:.2}", initial_capital + t.cumulative_usd),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the per-bar realized equity curve.
pub fn export_bar_equity_csv(rows: &[BarEquity]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar", "timestamp", "long_points", "short_points", "equity"])?;
    for r in rows {
        wtr.write_record([
            &r.bar.to_string(),
            &r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &format!("{:.6}", r.long_points),
            &format!("{:.6}", r.short_points),
            &format!("{:.2}", r.equity),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates a directory named `{symbol}_{run_id[..12]}/` under `output_dir`
/// containing:
/// - `manifest.json` — the full `BacktestResult`
/// - `trades_long.csv`, `trades_short.csv` — trade tapes
/// - `equity_long.csv`, `equity_short.csv` — per-trade equity curves
/// - `equity_by_bar.csv` — per-bar realized equity, both directions
/// - `report.md` — Markdown summary
///
/// Re-running the same config overwrites the same directory. Returns the
/// path to the directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = result.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("{}_{}", result.symbol, prefix));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("manifest.json"), &export_json(result)?)?;

    for direction in [Direction::Long, Direction::Short] {
        let trades = result.trades(direction);
        write(
            &run_dir.join(format!("trades_{direction}.csv")),
            &export_trades_csv(trades)?,
        )?;
        write(
            &run_dir.join(format!("equity_{direction}.csv")),
            &export_equity_csv(trades, result.initial_capital)?,
        )?;
    }

    write(
        &run_dir.join("equity_by_bar.csv"),
        &export_bar_equity_csv(&result.equity_by_bar)?,
    )?;
    write(&run_dir.join("report.md"), &generate_report(result))?;

    Ok(run_dir)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a single backtest run.
pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", result.symbol));
    md.push_str(&format!("| Period | {} to {} |\n", result.start, result.end));
    md.push_str(&format!("| Bars | {} |\n", result.bar_count));
    md.push_str(&format!("| Signals | {} |\n", result.signal_count));
    md.push_str(&format!("| Initial Capital | ${:.0} |\n", result.initial_capital));
    md.push_str(&format!("| Run ID | {} |\n", result.run_id));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if result.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    let p = &result.params;
    md.push_str("## Strategy\n\n");
    md.push_str(&format!(
        "- EMA spans: fast {} / slow {}\n",
        p.fast_span, p.slow_span
    ));
    md.push_str(&format!("- Event source: {:?}\n", p.event_source));
    md.push_str(&format!("- Classifier: {}\n", result.classifier));
    md.push_str(&format!(
        "- Slippage: long {} / short {} points per side\n",
        p.long_slippage, p.short_slippage
    ));
    md.push_str(&format!(
        "- Contract: {} x ${} per point\n\n",
        p.contract.contracts, p.contract.multiplier
    ));

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Long | Short |\n");
    md.push_str("| --- | --- | --- |\n");
    let (l, s) = (&result.long_stats, &result.short_stats);
    md.push_str(&format!("| Trades | {} | {} |\n", l.trade_count, s.trade_count));
    md.push_str(&format!(
        "| Total (points) | {:.2} | {:.2} |\n",
        l.total_points, s.total_points
    ));
    md.push_str(&format!(
        "| Mean (points) | {} | {} |\n",
        opt(l.mean_points, 2),
        opt(s.mean_points, 2)
    ));
    md.push_str(&format!(
        "| Std (points) | {} | {} |\n",
        opt(l.std_points, 2),
        opt(s.std_points, 2)
    ));
    md.push_str(&format!(
        "| Best / Worst | {} / {} | {} / {} |\n",
        opt(l.max_points, 2),
        opt(l.min_points, 2),
        opt(s.max_points, 2),
        opt(s.min_points, 2)
    ));
    md.push_str(&format!(
        "| Win Rate | {} | {} |\n",
        pct(l.win_rate),
        pct(s.win_rate)
    ));
    md.push_str(&format!(
        "| Max Drawdown (points) | {:.2} | {:.2} |\n",
        l.max_drawdown_points, s.max_drawdown_points
    ));
    md.push_str(&format!(
        "| Total ($) | {:.2} | {:.2} |\n",
        l.total_usd, s.total_usd
    ));
    md.push_str(&format!(
        "| Return | {:.2}% | {:.2}% |\n\n",
        l.pct_return, s.pct_return
    ));

    if let Some(bh) = &result.buy_and_hold {
        md.push_str("## Benchmark\n\n");
        md.push_str(&format!(
            "Buy and hold from {:.2} to {:.2}: {:.2} points, ${:.2} ({:.2}%)\n",
            bh.entry_price, bh.exit_price, bh.points, bh.total_usd, bh.pct_return
        ));
    }

    if !result.data_quality_warnings.is_empty() {
        md.push_str("\n## Data Quality\n\n");
        for w in &result.data_quality_warnings {
            md.push_str(&format!("- {w}\n"));
        }
    }

    md
}

fn opt(v: Option<f64>, decimals: usize) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.decimals$}"))
}

fn pct(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{:.1}%", x * 100.0))
}
