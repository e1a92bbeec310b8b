pub mod binance;

pub use binance::BinanceClient;

use crate::config::TimeframeConfig;
use crate::error::SourceError;
use crate::types::{PriceSeries, Quote};
use async_trait::async_trait;

/// Source of closing prices and live quotes.
///
/// Any error means the requested series or quote is unavailable for this
/// cycle; callers degrade instead of retrying.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Closing prices for an asset at a timeframe, oldest first.
    async fn closes(
        &self,
        asset_id: &str,
        timeframe: &TimeframeConfig,
    ) -> Result<PriceSeries, SourceError>;

    /// Latest price and 24h change for an asset.
    async fn quote(&self, asset_id: &str) -> Result<Quote, SourceError>;
}
