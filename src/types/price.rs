use serde::{Deserialize, Serialize};

/// Ordered closing prices for one (asset, timeframe), oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Create a series from closes in chronological order.
    pub fn new(closes: Vec<f64>) -> Self {
        Self { closes }
    }

    /// Closing prices, oldest first.
    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    /// Most recent close.
    pub fn last(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

impl From<Vec<f64>> for PriceSeries {
    fn from(closes: Vec<f64>) -> Self {
        Self::new(closes)
    }
}

/// Live quote used for display and as the flip reference price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Last traded price.
    pub price: f64,
    /// 24h price change in percent.
    pub change_24h_pct: f64,
}
