//! Performance metrics — pure functions over trade logs and bars.
//!
//! Every metric is a pure function: trades or bars in, scalars out. Point
//! values are per contract; dollar values apply the contract multiplier and
//! count.

use serde::{Deserialize, Serialize};

use hybridlab_core::domain::{Bar, Direction};
use hybridlab_core::engine::{ContractSpec, TradeLog};
use hybridlab_core::indicators::{mean, sample_std};

/// Statistics for one direction's trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub direction: Direction,
    pub trade_count: usize,
    pub total_points: f64,
    /// `None` for an empty log.
    pub mean_points: Option<f64>,
    /// Sample standard deviation. `None` with fewer than 2 trades.
    pub std_points: Option<f64>,
    pub min_points: Option<f64>,
    pub max_points: Option<f64>,
    /// Fraction of trades with positive PnL. `None` for an empty log.
    pub win_rate: Option<f64>,
    /// Deepest drop of cumulative PnL, in points. 0.0 or negative.
    pub max_drawdown_points: f64,
    pub total_usd: f64,
    /// Total dollars as a percentage of initial capital.
    pub pct_return: f64,
}

impl TradeStats {
    pub fn compute(log: &TradeLog, contract: &ContractSpec, initial_capital: f64) -> Self {
        let pnl: Vec<f64> = log.trades.iter().map(|t| t.pnl).collect();
        let total_points = log.total_points();
        let total_usd = contract.dollarize(total_points);
        Self {
            direction: log.direction,
            trade_count: pnl.len(),
            total_points,
            mean_points: mean(&pnl),
            std_points: sample_std(&pnl),
            min_points: pnl.iter().copied().reduce(f64::min),
            max_points: pnl.iter().copied().reduce(f64::max),
            win_rate: win_rate(log),
            max_drawdown_points: max_drawdown(&log.equity_curve()),
            total_usd,
            pct_return: pct_return(total_usd, initial_capital),
        }
    }
}

/// Buy at the first bar's open, sell at the last bar's open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuyAndHold {
    pub entry_price: f64,
    pub exit_price: f64,
    pub points: f64,
    pub total_usd: f64,
    pub pct_return: f64,
}

impl BuyAndHold {
    /// Benchmark on raw opens. `None` for an empty series.
    pub fn compute(bars: &[Bar], contract: &ContractSpec, initial_capital: f64) -> Option<Self> {
        let (first, last) = (bars.first()?, bars.last()?);
        let points = last.open - first.open;
        let total_usd = contract.dollarize(points);
        Some(Self {
            entry_price: first.open,
            exit_price: last.open,
            points,
            total_usd,
            pct_return: pct_return(total_usd, initial_capital),
        })
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Dollars as a percentage of initial capital. 0.0 for non-positive capital.
pub fn pct_return(usd: f64, initial_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    usd / initial_capital * 100.0
}

/// Fraction of trades with strictly positive PnL.
pub fn win_rate(log: &TradeLog) -> Option<f64> {
    if log.is_empty() {
        return None;
    }
    let wins = log.trades.iter().filter(|t| t.is_winner()).count();
    Some(wins as f64 / log.len() as f64)
}

/// Largest peak-to-trough drop of a cumulative PnL curve, in the curve's
/// units. Starts from a flat 0.0 peak. Returns a value <= 0.
pub fn max_drawdown(cumulative: &[f64]) -> f64 {
    cumulative
        .iter()
        .scan(0.0_f64, |peak, &v| {
            *peak = peak.max(v);
            Some(v - *peak)
        })
        .fold(0.0, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hybridlab_core::domain::Trade;

    fn contract() -> ContractSpec {
        ContractSpec::new(50.0, 1).unwrap()
    }

    fn log(direction: Direction, legs: &[(f64, f64)]) -> TradeLog {
        let trades: Vec<Trade> = legs
            .iter()
            .enumerate()
            .map(|(i, &(entry, exit))| Trade {
                direction,
                entry_index: 2 * i,
                entry_price: entry,
                exit_index: 2 * i + 1,
                exit_price: exit,
            })
            .collect();
        TradeLog::new(direction, 0.0, &trades)
    }

    #[test]
    fn stats_of_mixed_log() {
        let l = log(Direction::Long, &[(100.0, 110.0), (110.0, 105.0), (105.0, 111.0)]);
        let s = TradeStats::compute(&l, &contract(), 100_000.0);
        assert_eq!(s.trade_count, 3);
        assert_eq!(s.total_points, 11.0);
        assert!((s.mean_points.unwrap() - 11.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.min_points, Some(-5.0));
        assert_eq!(s.max_points, Some(10.0));
        assert!((s.win_rate.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.max_drawdown_points, -5.0);
        assert_eq!(s.total_usd, 550.0);
        assert!((s.pct_return - 0.55).abs() < 1e-12);
    }

    #[test]
    fn stats_of_empty_log() {
        let l = log(Direction::Short, &[]);
        let s = TradeStats::compute(&l, &contract(), 100_000.0);
        assert_eq!(s.trade_count, 0);
        assert_eq!(s.total_points, 0.0);
        assert_eq!(s.mean_points, None);
        assert_eq!(s.std_points, None);
        assert_eq!(s.min_points, None);
        assert_eq!(s.win_rate, None);
        assert_eq!(s.total_usd, 0.0);
    }

    #[test]
    fn single_trade_has_no_std() {
        let l = log(Direction::Long, &[(100.0, 101.0)]);
        let s = TradeStats::compute(&l, &contract(), 100_000.0);
        assert_eq!(s.std_points, None);
        assert_eq!(s.mean_points, Some(1.0));
    }

    #[test]
    fn short_stats_use_short_pnl() {
        let l = log(Direction::Short, &[(100.0, 90.0)]);
        let s = TradeStats::compute(&l, &contract(), 100_000.0);
        assert_eq!(s.total_points, 10.0);
        assert_eq!(s.win_rate, Some(1.0));
    }

    #[test]
    fn buy_and_hold_uses_raw_opens() {
        let t = NaiveDate::from_ymd_opt(2022, 1, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = vec![
            Bar::new(t, 4000.0, 4010.0, 3990.0, 4005.0),
            Bar::new(t + chrono::Duration::hours(4), 4100.0, 4110.0, 4090.0, 4105.0),
        ];
        let spec = ContractSpec::new(50.0, 2).unwrap();
        let bh = BuyAndHold::compute(&bars, &spec, 100_000.0).unwrap();
        assert_eq!(bh.points, 100.0);
        assert_eq!(bh.total_usd, 10_000.0);
        assert!((bh.pct_return - 10.0).abs() < 1e-12);
        assert!(BuyAndHold::compute(&[], &spec, 100_000.0).is_none());
    }

    #[test]
    fn pct_return_guards_capital() {
        assert_eq!(pct_return(500.0, 0.0), 0.0);
        assert_eq!(pct_return(500.0, 1000.0), 50.0);
    }

    #[test]
    fn drawdown_from_flat_start() {
        assert_eq!(max_drawdown(&[]), 0.0);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[5.0, 2.0, 6.0, 1.0]), -5.0);
        assert_eq!(max_drawdown(&[-3.0, -1.0]), -3.0);
    }
}
