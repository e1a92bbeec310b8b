use crate::config::TimeframeConfig;
use crate::error::SourceError;
use crate::sources::MarketDataProvider;
use crate::types::{PriceSeries, Quote};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Close price position inside a kline row.
const KLINE_CLOSE_INDEX: usize = 4;

/// Binance 24hr ticker response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTicker {
    last_price: String,
    price_change_percent: String,
}

/// Binance REST client for klines and 24h tickers.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl BinanceClient {
    /// Create a new Binance client against `base_url` (e.g. `https://api.binance.com/api/v3`).
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("cryptoflip/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        }
    }

    fn map_err(&self, e: reqwest::Error) -> SourceError {
        if e.is_timeout() {
            SourceError::Timeout(self.timeout_secs)
        } else {
            SourceError::Reqwest(e)
        }
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, SourceError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(
                "Binance API returned {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            );
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

/// Extract close prices from raw kline rows.
fn parse_closes(rows: &[Vec<serde_json::Value>]) -> Result<Vec<f64>, SourceError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let value = row.get(KLINE_CLOSE_INDEX).ok_or_else(|| {
                SourceError::Malformed(format!("kline {} has {} fields", i, row.len()))
            })?;
            let close = match value {
                serde_json::Value::String(s) => s.parse::<f64>().ok(),
                serde_json::Value::Number(n) => n.as_f64(),
                _ => None,
            };
            close
                .filter(|c| c.is_finite())
                .ok_or_else(|| SourceError::Malformed(format!("kline {} close {}", i, value)))
        })
        .collect()
}

fn parse_number(field: &str, value: &str) -> Result<f64, SourceError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SourceError::Malformed(format!("{} {:?}", field, value)))
}

#[async_trait]
impl MarketDataProvider for BinanceClient {
    async fn closes(
        &self,
        asset_id: &str,
        timeframe: &TimeframeConfig,
    ) -> Result<PriceSeries, SourceError> {
        let url = format!("{}/klines", self.base_url);
        let query = [
            ("symbol", asset_id.to_string()),
            ("interval", timeframe.interval.clone()),
            ("limit", timeframe.history.to_string()),
        ];

        let rows: Vec<Vec<serde_json::Value>> = self
            .get(&url, &query)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let closes = parse_closes(&rows)?;
        debug!(
            "Binance klines {} {}: {} closes",
            asset_id,
            timeframe.key,
            closes.len()
        );
        Ok(PriceSeries::new(closes))
    }

    async fn quote(&self, asset_id: &str) -> Result<Quote, SourceError> {
        let url = format!("{}/ticker/24hr", self.base_url);
        let query = [("symbol", asset_id.to_string())];

        let ticker: BinanceTicker = self
            .get(&url, &query)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        Ok(Quote {
            price: parse_number("lastPrice", &ticker.last_price)?,
            change_24h_pct: parse_number("priceChangePercent", &ticker.price_change_percent)?,
        })
    }
}
