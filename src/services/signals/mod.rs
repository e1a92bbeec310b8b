//! Trend classification and flip detection.
//!
//! Data flows one way per cycle: closes go through the indicators, each
//! timeframe is classified, the verdicts are aggregated per asset and the
//! aggregate is compared against the last persisted snapshot.

pub mod aggregator;
pub mod classifier;
pub mod flip;
pub mod indicators;
pub mod store;

pub use aggregator::aggregate;
pub use classifier::classify;
pub use flip::{detect_flip, FlipDetector};
pub use indicators::IndicatorCalculator;
pub use store::{ConfidenceFilter, SignalFilter, SignalStore};

/// Trait for implementing technical indicators over closing prices.
pub trait Indicator: Send + Sync {
    /// Unique identifier for this indicator.
    fn id(&self) -> &'static str;

    /// Minimum number of closes required for calculation.
    fn min_periods(&self) -> usize;

    /// Calculate the latest indicator value.
    /// Returns None if there is insufficient data.
    fn calculate(&self, closes: &[f64]) -> Option<f64>;
}
