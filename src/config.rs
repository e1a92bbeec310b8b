use std::env;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::types::SignalParams;

/// Intervals accepted by the Binance klines endpoint.
pub const BINANCE_INTERVALS: &[&str] = &[
    "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w", "1M",
];

/// Default watch list: (Binance pair, display name).
pub const DEFAULT_ASSETS: &[(&str, &str)] = &[
    ("BTCUSDT", "Bitcoin"),
    ("ETHUSDT", "Ethereum"),
    ("SOLUSDT", "Solana"),
    ("BNBUSDT", "BNB"),
    ("XRPUSDT", "XRP"),
    ("ADAUSDT", "Cardano"),
    ("AVAXUSDT", "Avalanche"),
    ("DOGEUSDT", "Dogecoin"),
    ("DOTUSDT", "Polkadot"),
    ("MATICUSDT", "Polygon"),
    ("LINKUSDT", "Chainlink"),
    ("UNIUSDT", "Uniswap"),
];

const DEFAULT_TIMEFRAMES: &str = "1h:50,4h:50,1d:50,1w:50";

/// One timeframe to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeframeConfig {
    /// Key used in API responses and filters (e.g. "4h").
    pub key: String,
    /// Display label (e.g. "4H").
    pub label: String,
    /// Provider interval code.
    pub interval: String,
    /// Number of closes to fetch.
    pub history: usize,
}

impl TimeframeConfig {
    pub fn new(interval: &str, history: usize) -> Self {
        Self {
            key: interval.to_string(),
            label: interval.to_uppercase(),
            interval: interval.to_string(),
            history,
        }
    }
}

/// One asset on the watch list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    /// Provider symbol (e.g. "BTCUSDT").
    pub id: String,
    /// Display name.
    pub name: String,
}

impl AssetConfig {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_uppercase(),
            name: name.to_string(),
        }
    }
}

/// Where signal snapshots are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotBackend {
    Sqlite { path: String },
    Redis { url: String },
    Memory,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Indicator periods and confirmation thresholds.
    pub signal: SignalParams,
    /// Timeframes evaluated for every asset, in display order.
    pub timeframes: Vec<TimeframeConfig>,
    /// Assets evaluated every cycle.
    pub assets: Vec<AssetConfig>,
    /// Seconds between evaluation cycles.
    pub refresh_interval_secs: u64,
    /// Time budget for the fetch phase of one cycle.
    pub cycle_budget_secs: u64,
    /// Timeout for a single provider request.
    pub fetch_timeout_secs: u64,
    /// Binance REST base URL.
    pub binance_api_url: String,
    /// Snapshot persistence backend.
    pub snapshot_backend: SnapshotBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            signal: SignalParams {
                fast_period: 9,
                slow_period: 21,
                momentum_period: 14,
                upper_threshold: 52.0,
                lower_threshold: 48.0,
            },
            // Static default, always parses.
            timeframes: parse_timeframes(DEFAULT_TIMEFRAMES).unwrap_or_default(),
            assets: DEFAULT_ASSETS
                .iter()
                .map(|(id, name)| AssetConfig::new(id, name))
                .collect(),
            refresh_interval_secs: 300,
            cycle_budget_secs: 60,
            fetch_timeout_secs: 10,
            binance_api_url: "https://api.binance.com/api/v3".to_string(),
            snapshot_backend: SnapshotBackend::Sqlite {
                path: "cryptoflip.db".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeframes = match lookup("TIMEFRAMES") {
            Some(raw) => parse_timeframes(&raw)?,
            None => defaults.timeframes,
        };

        let assets = match lookup("ASSETS") {
            Some(raw) => parse_assets(&raw),
            None => defaults.assets,
        };

        let snapshot_backend = match lookup("SNAPSHOT_STORE")
            .unwrap_or_else(|| "sqlite".to_string())
            .to_lowercase()
            .as_str()
        {
            "sqlite" => SnapshotBackend::Sqlite {
                path: lookup("SNAPSHOT_DB_PATH").unwrap_or_else(|| "cryptoflip.db".to_string()),
            },
            "redis" => SnapshotBackend::Redis {
                url: lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            },
            "memory" => SnapshotBackend::Memory,
            other => return Err(ConfigError::Backend(other.to_string())),
        };

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            signal: SignalParams {
                fast_period: parse_var(&lookup, "EMA_FAST").unwrap_or(defaults.signal.fast_period),
                slow_period: parse_var(&lookup, "EMA_SLOW").unwrap_or(defaults.signal.slow_period),
                momentum_period: parse_var(&lookup, "RSI_PERIOD").unwrap_or(defaults.signal.momentum_period),
                upper_threshold: parse_var(&lookup, "RSI_BULL").unwrap_or(defaults.signal.upper_threshold),
                lower_threshold: parse_var(&lookup, "RSI_BEAR").unwrap_or(defaults.signal.lower_threshold),
            },
            timeframes,
            assets,
            refresh_interval_secs: parse_var(&lookup, "REFRESH_INTERVAL_SECS")
                .unwrap_or(defaults.refresh_interval_secs),
            cycle_budget_secs: parse_var(&lookup, "CYCLE_BUDGET_SECS").unwrap_or(defaults.cycle_budget_secs),
            fetch_timeout_secs: parse_var(&lookup, "FETCH_TIMEOUT_SECS")
                .unwrap_or(defaults.fetch_timeout_secs),
            binance_api_url: lookup("BINANCE_API_URL").unwrap_or(defaults.binance_api_url),
            snapshot_backend,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the classifier cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.signal;
        if s.fast_period == 0 {
            return Err(ConfigError::ZeroPeriod { name: "EMA_FAST" });
        }
        if s.slow_period == 0 {
            return Err(ConfigError::ZeroPeriod { name: "EMA_SLOW" });
        }
        if s.momentum_period == 0 {
            return Err(ConfigError::ZeroPeriod { name: "RSI_PERIOD" });
        }
        if s.fast_period >= s.slow_period {
            return Err(ConfigError::PeriodOrder {
                fast: s.fast_period,
                slow: s.slow_period,
            });
        }
        for t in [s.lower_threshold, s.upper_threshold] {
            if !(0.0..=100.0).contains(&t) {
                return Err(ConfigError::ThresholdRange(t));
            }
        }
        if s.lower_threshold > s.upper_threshold {
            return Err(ConfigError::ThresholdOrder {
                lower: s.lower_threshold,
                upper: s.upper_threshold,
            });
        }
        if self.timeframes.is_empty() {
            return Err(ConfigError::Empty("timeframes"));
        }
        if self.assets.is_empty() {
            return Err(ConfigError::Empty("assets"));
        }
        for (name, secs) in [
            ("REFRESH_INTERVAL_SECS", self.refresh_interval_secs),
            ("CYCLE_BUDGET_SECS", self.cycle_budget_secs),
            ("FETCH_TIMEOUT_SECS", self.fetch_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ZeroInterval { name });
            }
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| v.trim().parse().ok())
}

/// Parse `interval:history` entries, e.g. "1h:50,4h:50".
///
/// History defaults to 50 when omitted.
pub fn parse_timeframes(raw: &str) -> Result<Vec<TimeframeConfig>, ConfigError> {
    let mut timeframes: Vec<TimeframeConfig> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.splitn(2, ':');
        let interval = parts.next().unwrap_or_default().trim();
        let history = match parts.next() {
            Some(h) => h
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Timeframe(entry.to_string()))?,
            None => 50,
        };

        if !BINANCE_INTERVALS.contains(&interval) || history == 0 {
            return Err(ConfigError::Timeframe(entry.to_string()));
        }
        if timeframes.iter().any(|t| t.key == interval) {
            return Err(ConfigError::Timeframe(entry.to_string()));
        }

        timeframes.push(TimeframeConfig::new(interval, history));
    }

    Ok(timeframes)
}

/// Parse `SYMBOL` or `SYMBOL:Name` entries.
pub fn parse_assets(raw: &str) -> Vec<AssetConfig> {
    let mut assets: Vec<AssetConfig> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let parts: Vec<&str> = entry.splitn(2, ':').collect();
        let id = parts[0].trim();
        if id.is_empty() {
            continue;
        }
        let name = parts.get(1).map(|n| n.trim()).unwrap_or(id);
        let asset = AssetConfig::new(id, name);
        if !assets.iter().any(|a| a.id == asset.id) {
            assets.push(asset);
        }
    }

    assets
}
