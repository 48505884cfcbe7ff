//! End-to-end scenario on a hand-computed six-bar series.
//!
//! Bars (o, h, l, c):
//!   0: (100, 102,  99, 101)    HA open 100         HA close 100.5
//!   1: (101, 103, 100, 102)    HA open 100.25      HA close 101.5
//!   2: ( 99, 101,  98, 100)    HA open 100.875     HA close  99.5
//!   3: ( 90,  91,  85,  86)    HA open 100.1875    HA close  88
//!   4: ( 85,  86,  80,  81)    HA open  94.09375   HA close  83
//!   5: ( 80,  81,  75,  76)    HA open  88.546875  HA close  78
//!
//! Fast span 1, slow span 5 over the HA open:
//!   raw state  [0, 1, 1, 0, 0, 0]
//!   diff       [0, +1, 0, -1, 0, 0]
//!   trend      [0, 0, +1, 0, -1, 0]   (diff shifted one bar)
//!
//! All HA opens are dyadic rationals, so every expected price below is exact.

use chrono::{Duration, NaiveDate};
use hybridlab_core::classifier::{ConstantClassifier, FixedLabels, ReturnSignClassifier};
use hybridlab_core::domain::{Bar, Direction, DirectionLabel, Signal};
use hybridlab_core::engine::{ContractSpec, EventSource, Pipeline, StrategyParams};
use hybridlab_core::indicators::smooth;
use hybridlab_core::signals::TrendFilter;

use DirectionLabel::{Down, Up};

fn bars(ohlc: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2022, 1, 3)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    ohlc.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Bar::new(base + Duration::hours(4 * i as i64), o, h, l, c))
        .collect()
}

fn six_bars() -> Vec<Bar> {
    bars(&[
        (100.0, 102.0, 99.0, 101.0),
        (101.0, 103.0, 100.0, 102.0),
        (99.0, 101.0, 98.0, 100.0),
        (90.0, 91.0, 85.0, 86.0),
        (85.0, 86.0, 80.0, 81.0),
        (80.0, 81.0, 75.0, 76.0),
    ])
}

fn three_bars() -> Vec<Bar> {
    six_bars()[..3].to_vec()
}

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

#[test]
fn three_bar_smoothing_and_emas() {
    let ha = smooth(&three_bars()).unwrap();
    let opens: Vec<f64> = ha.iter().map(|b| b.open).collect();
    assert_eq!(opens, vec![100.0, 100.25, 100.875]);

    let (fast, _) = TrendFilter::new(1, 5).unwrap().emas(&opens).unwrap();
    assert_eq!(fast, opens);
}

#[test]
fn three_bar_single_crossover_one_entry_no_trade() {
    let out = Pipeline::new(params(EventSource::FusedSignal))
        .unwrap()
        .run(&three_bars(), &ConstantClassifier(Up))
        .unwrap();

    assert_eq!(out.trend, vec![Signal::Flat, Signal::Flat, Signal::Long]);
    assert_eq!(out.final_signal.iter().filter(|&&s| s == Signal::Long).count(), 1);
    // Entered at bar 2, never exited: not counted.
    assert!(out.long.is_empty());
    assert!(out.short.is_empty());
}

#[test]
fn six_bar_smoothed_opens() {
    let ha = smooth(&six_bars()).unwrap();
    let opens: Vec<f64> = ha.iter().map(|b| b.open).collect();
    assert_eq!(
        opens,
        vec![100.0, 100.25, 100.875, 100.1875, 94.09375, 88.546875]
    );
}

#[test]
fn six_bar_trend_states() {
    let ha = smooth(&six_bars()).unwrap();
    let opens: Vec<f64> = ha.iter().map(|b| b.open).collect();
    let filter = TrendFilter::new(1, 5).unwrap();
    assert_eq!(filter.raw_state(&opens).unwrap(), vec![0, 1, 1, 0, 0, 0]);
    assert_eq!(
        filter.trend(&opens).unwrap(),
        vec![
            Signal::Flat,
            Signal::Flat,
            Signal::Long,
            Signal::Flat,
            Signal::Short,
            Signal::Flat
        ]
    );
}

#[test]
fn six_bar_opposite_crossover_closes_one_trade() {
    let labels = FixedLabels::new(vec![Up, Up, Up, Down, Down, Down]);
    let out = Pipeline::new(params(EventSource::FusedSignal))
        .unwrap()
        .run(&six_bars(), &labels)
        .unwrap();

    assert_eq!(out.realized, vec![Down, Up, Up, Down, Down, Down]);
    assert_eq!(
        out.final_signal,
        vec![
            Signal::Flat,
            Signal::Flat,
            Signal::Long,
            Signal::Flat,
            Signal::Short,
            Signal::Flat
        ]
    );

    assert_eq!(out.long.len(), 1);
    let t = &out.long.trades[0];
    assert_eq!(t.trade.entry_index, 2);
    assert_eq!(t.trade.exit_index, 4);
    assert_eq!(t.trade.entry_price, 100.875);
    assert_eq!(t.trade.exit_price, 94.09375);
    assert_eq!(t.pnl, 94.09375 - 100.875);
    assert_eq!(t.cumulative_pnl, t.pnl);

    // Short opened at bar 4 and never covered.
    assert!(out.short.is_empty());
}

#[test]
fn six_bar_return_sign_classifier_matches_realized() {
    // Return-sign prediction equals the realized direction, so stage 2 passes
    // every stage-1 signal through.
    let out = Pipeline::new(params(EventSource::FusedSignal))
        .unwrap()
        .run(&six_bars(), &ReturnSignClassifier)
        .unwrap();
    assert_eq!(out.predicted, out.realized);
    assert_eq!(out.long.len(), 1);
}

#[test]
fn six_bar_crossover_variant_trades_same_bar() {
    let out = Pipeline::new(params(EventSource::Crossover))
        .unwrap()
        .run(&six_bars(), &ConstantClassifier(Down))
        .unwrap();

    assert_eq!(out.long.len(), 1);
    let t = &out.long.trades[0];
    assert_eq!((t.trade.entry_index, t.trade.exit_index), (1, 3));
    assert_eq!(t.pnl, 100.1875 - 100.25);
    assert!(out.short.is_empty());
}

#[test]
fn slippage_applies_per_direction() {
    let mut p = params(EventSource::FusedSignal);
    p.long_slippage = 0.5;
    let labels = FixedLabels::new(vec![Up, Up, Up, Down, Down, Down]);
    let out = Pipeline::new(p).unwrap().run(&six_bars(), &labels).unwrap();
    let t = &out.long.trades[0];
    assert_eq!(t.entry_price_adj, 101.375);
    assert_eq!(t.exit_price_adj, 93.59375);
    assert_eq!(t.pnl, 93.59375 - 101.375);
    assert_eq!(out.log(Direction::Long).summary().trade_count, 1);
}

#[test]
fn dollarized_total() {
    let labels = FixedLabels::new(vec![Up, Up, Up, Down, Down, Down]);
    let p = params(EventSource::FusedSignal);
    let out = Pipeline::new(p).unwrap().run(&six_bars(), &labels).unwrap();
    let usd = p.contract.dollarize(out.long.summary().total_points);
    assert_eq!(usd, (94.09375 - 100.875) * 50.0);
}
