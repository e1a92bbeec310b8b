//! Exponential Moving Average (EMA) indicator.

use crate::services::signals::Indicator;

/// EMA (Exponential Moving Average) indicator.
///
/// Seeded with the simple mean of the first `period` closes, then smoothed
/// with `k = 2 / (period + 1)` over every later close in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Smoothing factor.
    pub fn multiplier(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// Continue the recurrence from a previously computed value.
    pub fn resume(&self, previous: f64, closes: &[f64]) -> f64 {
        let k = self.multiplier();
        closes
            .iter()
            .fold(previous, |ema, close| close * k + ema * (1.0 - k))
    }
}

impl Indicator for Ema {
    fn id(&self) -> &'static str {
        "ema"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, closes: &[f64]) -> Option<f64> {
        if self.period == 0 || closes.len() < self.period {
            return None;
        }

        // First EMA is SMA
        let sma = closes[..self.period].iter().sum::<f64>() / self.period as f64;

        Some(self.resume(sma, &closes[self.period..]))
    }
}
