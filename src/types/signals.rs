use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a classified signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bullish" | "bull" => Some(Self::Bullish),
            "bearish" | "bear" => Some(Self::Bearish),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reliability-tagged asset classification.
///
/// This is the state tracked across cycles by the flip detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Confidence {
    ConfirmedBullish,
    ConfirmedBearish,
    WeakBullish,
    WeakBearish,
    Neutral,
}

impl Confidence {
    /// Whether landing on this state is worth an alert.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::ConfirmedBullish | Self::ConfirmedBearish)
    }

    /// Direction this confidence points to.
    pub fn direction(&self) -> Direction {
        match self {
            Self::ConfirmedBullish | Self::WeakBullish => Direction::Bullish,
            Self::ConfirmedBearish | Self::WeakBearish => Direction::Bearish,
            Self::Neutral => Direction::Neutral,
        }
    }

    /// Stable storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfirmedBullish => "confirmed-bullish",
            Self::ConfirmedBearish => "confirmed-bearish",
            Self::WeakBullish => "weak-bullish",
            Self::WeakBearish => "weak-bearish",
            Self::Neutral => "neutral",
        }
    }

    /// Parse a storage key.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "confirmed-bullish" => Some(Self::ConfirmedBullish),
            "confirmed-bearish" => Some(Self::ConfirmedBearish),
            "weak-bullish" => Some(Self::WeakBullish),
            "weak-bearish" => Some(Self::WeakBearish),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// Get display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConfirmedBullish => "Confirmed Bullish",
            Self::ConfirmedBearish => "Confirmed Bearish",
            Self::WeakBullish => "Weak Bullish",
            Self::WeakBearish => "Weak Bearish",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator and threshold parameters for one classification pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalParams {
    /// Fast exponential trend period.
    pub fast_period: usize,
    /// Slow exponential trend period.
    pub slow_period: usize,
    /// Momentum oscillator period.
    pub momentum_period: usize,
    /// Bullish direction is confirmed above this momentum.
    pub upper_threshold: f64,
    /// Bearish direction is confirmed below this momentum.
    pub lower_threshold: f64,
}

/// Raw indicator values for one (asset, timeframe). `None` = insufficient data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorResult {
    pub fast_trend: Option<f64>,
    pub slow_trend: Option<f64>,
    pub momentum: Option<f64>,
}

impl IndicatorResult {
    /// Result for a timeframe whose series could not be obtained.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// Classification verdict for a single timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeSignal {
    pub direction: Direction,
    /// Momentum agrees with the trend direction beyond the dead-band.
    pub confirmed: bool,
    /// Human-readable justification.
    pub reason: String,
    /// (fast - slow) / slow * 100.
    pub trend_spread_pct: Option<f64>,
    pub momentum: Option<f64>,
    pub fast_trend: Option<f64>,
    pub slow_trend: Option<f64>,
}

/// A timeframe's verdict tagged with its timeframe key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeResult {
    /// Timeframe key (e.g. "1h").
    pub timeframe: String,
    /// Display label (e.g. "1H").
    pub label: String,
    /// False when the series fetch failed or timed out.
    pub available: bool,
    pub signal: TimeframeSignal,
}

/// Aggregated signal for one asset across all configured timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSignal {
    pub overall: Direction,
    pub confidence: Confidence,
    /// 0..1, used for ranking.
    pub strength: f64,
    /// Timeframes pointing bullish, confirmed or not.
    pub bullish_count: usize,
    /// Timeframes pointing bearish, confirmed or not.
    pub bearish_count: usize,
    /// Number of timeframes aggregated.
    pub total: usize,
}

/// Last persisted classification for an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSnapshot {
    pub asset_id: String,
    pub confidence: Confidence,
    pub reference_price: f64,
    /// Unix timestamp (milliseconds).
    pub recorded_at: i64,
}

/// A transition landing on a confirmed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipEvent {
    pub asset_id: String,
    pub from: Confidence,
    pub to: Confidence,
    pub reference_price: f64,
    /// Unix timestamp (milliseconds).
    pub timestamp: i64,
}

/// Full evaluation of one asset in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEvaluation {
    pub asset_id: String,
    pub name: String,
    /// Quote price, when the quote fetch succeeded.
    pub price: Option<f64>,
    /// 24h change in percent, when the quote fetch succeeded.
    pub change_24h_pct: Option<f64>,
    /// Per-timeframe verdicts in configured order.
    pub timeframes: Vec<TimeframeResult>,
    pub signal: AssetSignal,
    /// Price recorded with the snapshot and any flip.
    pub reference_price: f64,
    /// False when every fetch for this asset failed.
    pub reachable: bool,
    /// Unix timestamp (milliseconds).
    pub evaluated_at: i64,
}

impl AssetEvaluation {
    /// Signal for a timeframe key, if configured.
    pub fn timeframe(&self, key: &str) -> Option<&TimeframeSignal> {
        self.timeframes
            .iter()
            .find(|t| t.timeframe == key)
            .map(|t| &t.signal)
    }
}

/// Counts by overall direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionCounts {
    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
}

impl DirectionCounts {
    pub fn record(&mut self, direction: Direction) {
        match direction {
            Direction::Bullish => self.bullish += 1,
            Direction::Bearish => self.bearish += 1,
            Direction::Neutral => self.neutral += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.bullish + self.bearish + self.neutral
    }
}

/// Outcome of one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    /// Unix timestamp (milliseconds) when the cycle started.
    pub started_at: i64,
    pub duration_ms: u64,
    /// Assets evaluated this cycle.
    pub evaluated: Vec<String>,
    /// Assets skipped (deadline missed or previous cycle still running).
    pub skipped: Vec<String>,
    /// Assets whose every fetch failed.
    pub unreachable: Vec<String>,
    pub flips: Vec<FlipEvent>,
    pub counts: DirectionCounts,
}

/// Dashboard-level totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSummary {
    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
    pub total: usize,
    pub confirmed_bullish: usize,
    pub confirmed_bearish: usize,
    /// Weak bullish plus weak bearish.
    pub weak: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle: Option<CycleReport>,
}
