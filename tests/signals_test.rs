//! Classification pipeline from close series to flip decisions.

use cryptoflip::services::signals::{aggregate, classify, FlipDetector, IndicatorCalculator};
use cryptoflip::services::{InMemorySnapshotStore, SnapshotStore};
use cryptoflip::types::{AssetSignal, Confidence, Direction, PriceSeries, SignalParams};
use std::sync::Arc;

fn params() -> SignalParams {
    SignalParams {
        fast_period: 3,
        slow_period: 7,
        momentum_period: 4,
        upper_threshold: 52.0,
        lower_threshold: 48.0,
    }
}

fn rising() -> PriceSeries {
    PriceSeries::new((1..=30).map(|i| i as f64).collect())
}

fn falling() -> PriceSeries {
    PriceSeries::new((1..=30).rev().map(|i| i as f64).collect())
}

fn short() -> PriceSeries {
    PriceSeries::new(vec![1.0, 2.0, 3.0])
}

fn evaluate(series: &[PriceSeries]) -> AssetSignal {
    let calculator = IndicatorCalculator::new(&params());
    let signals: Vec<_> = series
        .iter()
        .map(|s| classify(&calculator.run(s), &params()))
        .collect();
    aggregate(&signals)
}

// ===== Pipeline Tests =====

#[test]
fn test_uptrend_confirms_bullish() {
    let signal = evaluate(&[rising(), rising(), rising(), rising()]);
    assert_eq!(signal.confidence, Confidence::ConfirmedBullish);
    assert_eq!(signal.overall, Direction::Bullish);
    assert_eq!(signal.strength, 1.0);
    assert_eq!(signal.bullish_count, 4);
}

#[test]
fn test_downtrend_confirms_bearish() {
    let signal = evaluate(&[falling(), falling(), falling()]);
    assert_eq!(signal.confidence, Confidence::ConfirmedBearish);
    assert_eq!(signal.bearish_count, 3);
    assert_eq!(signal.total, 3);
}

#[test]
fn test_short_history_counts_as_neutral_timeframe() {
    let signal = evaluate(&[rising(), rising(), rising(), short()]);
    assert_eq!(signal.confidence, Confidence::ConfirmedBullish);
    assert_eq!(signal.strength, 0.75);
    assert_eq!(signal.bullish_count, 3);
    assert_eq!(signal.bearish_count, 0);
    assert_eq!(signal.total, 4);
}

#[test]
fn test_split_timeframes_are_neutral() {
    let signal = evaluate(&[rising(), rising(), falling(), falling()]);
    assert_eq!(signal.confidence, Confidence::Neutral);
    assert_eq!(signal.strength, 0.5);
}

#[test]
fn test_short_history_reason() {
    let calculator = IndicatorCalculator::new(&params());
    let signal = classify(&calculator.run(&short()), &params());
    assert_eq!(signal.direction, Direction::Neutral);
    assert!(!signal.confirmed);
    assert_eq!(signal.reason, "insufficient data");
}

// ===== Flip Tests =====

#[tokio::test]
async fn test_trend_reversal_fires_single_flip() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let detector = FlipDetector::new(store.clone());

    let bearish = evaluate(&[falling(), falling(), falling(), falling()]);
    assert!(detector.observe("BTCUSDT", &bearish, 1.0).await.is_none());
    assert!(detector.observe("BTCUSDT", &bearish, 1.0).await.is_none());

    let bullish = evaluate(&[rising(), rising(), rising(), rising()]);
    let event = detector.observe("BTCUSDT", &bullish, 30.0).await.unwrap();
    assert_eq!(event.from, Confidence::ConfirmedBearish);
    assert_eq!(event.to, Confidence::ConfirmedBullish);
    assert_eq!(event.reference_price, 30.0);

    assert!(detector.observe("BTCUSDT", &bullish, 30.0).await.is_none());

    let snapshot = store.get("BTCUSDT").await.unwrap().unwrap();
    assert_eq!(snapshot.confidence, Confidence::ConfirmedBullish);
}

#[tokio::test]
async fn test_decay_to_neutral_is_silent() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let detector = FlipDetector::new(store.clone());

    let bullish = evaluate(&[rising(), rising(), rising(), rising()]);
    let split = evaluate(&[rising(), rising(), falling(), falling()]);

    assert!(detector.observe("ETHUSDT", &bullish, 1.0).await.is_none());
    assert!(detector.observe("ETHUSDT", &split, 1.0).await.is_none());
    assert_eq!(
        store.get("ETHUSDT").await.unwrap().unwrap().confidence,
        Confidence::Neutral
    );

    // Returning to a confirmed state from neutral is a flip.
    let event = detector.observe("ETHUSDT", &bullish, 2.0).await.unwrap();
    assert_eq!(event.from, Confidence::Neutral);
}
