//! Technical indicator implementations.

pub mod ema;
pub mod rsi;

pub use ema::Ema;
pub use rsi::Rsi;

use super::Indicator;
use crate::types::{IndicatorResult, PriceSeries, SignalParams};

/// Computes the trend pair and momentum for one (asset, timeframe).
#[derive(Debug, Clone, Copy)]
pub struct IndicatorCalculator {
    fast: Ema,
    slow: Ema,
    momentum: Rsi,
}

impl IndicatorCalculator {
    pub fn new(params: &SignalParams) -> Self {
        Self {
            fast: Ema::new(params.fast_period),
            slow: Ema::new(params.slow_period),
            momentum: Rsi::new(params.momentum_period),
        }
    }

    /// One-shot computation with the given parameters.
    pub fn compute(series: &PriceSeries, params: &SignalParams) -> IndicatorResult {
        Self::new(params).run(series)
    }

    /// Run every indicator over the series. Missing values mean insufficient data.
    pub fn run(&self, series: &PriceSeries) -> IndicatorResult {
        let closes = series.closes();
        IndicatorResult {
            fast_trend: self.fast.calculate(closes),
            slow_trend: self.slow.calculate(closes),
            momentum: self.momentum.calculate(closes),
        }
    }

    /// Longest history any indicator needs to produce a value.
    pub fn min_periods(&self) -> usize {
        [
            self.fast.min_periods(),
            self.slow.min_periods(),
            self.momentum.min_periods(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SignalParams {
        SignalParams {
            fast_period: 9,
            slow_period: 21,
            momentum_period: 14,
            upper_threshold: 52.0,
            lower_threshold: 48.0,
        }
    }

    #[test]
    fn test_compute_full_history() {
        let series = PriceSeries::new((0..50).map(|i| 100.0 + i as f64).collect());
        let result = IndicatorCalculator::compute(&series, &params());
        let fast = result.fast_trend.unwrap();
        let slow = result.slow_trend.unwrap();
        assert!(fast > slow);
        assert_eq!(result.momentum, Some(100.0));
    }

    #[test]
    fn test_compute_partial_history() {
        // Enough for fast trend and momentum, not for the slow trend
        let series = PriceSeries::new((0..15).map(|i| i as f64).collect());
        let result = IndicatorCalculator::compute(&series, &params());
        assert!(result.fast_trend.is_some());
        assert!(result.slow_trend.is_none());
        assert!(result.momentum.is_some());
    }

    #[test]
    fn test_compute_empty_series() {
        let result = IndicatorCalculator::compute(&PriceSeries::default(), &params());
        assert_eq!(result, IndicatorResult::unavailable());
    }

    #[test]
    fn test_min_periods() {
        assert_eq!(IndicatorCalculator::new(&params()).min_periods(), 21);
        let mut p = params();
        p.momentum_period = 30;
        assert_eq!(IndicatorCalculator::new(&p).min_periods(), 31);
    }
}
