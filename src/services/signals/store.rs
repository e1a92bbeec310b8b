//! Latest published evaluations, queried by the HTTP layer.

use crate::types::{
    AssetEvaluation, Confidence, CycleReport, Direction, DirectionCounts, SignalSummary,
};
use dashmap::DashMap;
use std::sync::{Arc, RwLock};

/// Confidence selector for listing evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceFilter {
    Exact(Confidence),
    /// Either weak state.
    Weak,
}

impl ConfidenceFilter {
    /// Parse a confidence key or `weak`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "weak" => Some(Self::Weak),
            other => Confidence::from_str(other).map(Self::Exact),
        }
    }

    pub fn matches(&self, confidence: Confidence) -> bool {
        match self {
            Self::Exact(wanted) => *wanted == confidence,
            Self::Weak => matches!(confidence, Confidence::WeakBullish | Confidence::WeakBearish),
        }
    }
}

/// Filter for listing evaluations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalFilter {
    /// Keep only this direction.
    pub signal: Option<Direction>,
    /// Apply the direction filter to this timeframe instead of the overall signal.
    pub timeframe: Option<String>,
    /// Keep only this overall confidence.
    pub confidence: Option<ConfidenceFilter>,
    /// Case-insensitive substring of the asset id or name.
    pub search: Option<String>,
}

impl SignalFilter {
    fn matches(&self, evaluation: &AssetEvaluation) -> bool {
        if let Some(confidence) = self.confidence {
            if !confidence.matches(evaluation.signal.confidence) {
                return false;
            }
        }

        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            if !evaluation.asset_id.to_lowercase().contains(&term)
                && !evaluation.name.to_lowercase().contains(&term)
            {
                return false;
            }
        }

        let Some(wanted) = self.signal else {
            return true;
        };

        let direction = match &self.timeframe {
            Some(key) => evaluation
                .timeframe(key)
                .map(|s| s.direction)
                .unwrap_or(Direction::Neutral),
            None => evaluation.signal.overall,
        };

        direction == wanted
    }
}

/// Store of the latest evaluation per asset and the last cycle report.
#[derive(Default)]
pub struct SignalStore {
    evaluations: DashMap<String, AssetEvaluation>,
    last_cycle: RwLock<Option<CycleReport>>,
}

impl SignalStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace the published evaluation for an asset.
    pub fn publish(&self, evaluation: AssetEvaluation) {
        self.evaluations
            .insert(evaluation.asset_id.clone(), evaluation);
    }

    pub fn record_cycle(&self, report: CycleReport) {
        let mut guard = self.last_cycle.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(report);
    }

    pub fn last_cycle(&self) -> Option<CycleReport> {
        self.last_cycle
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Latest evaluation for an asset (case-insensitive id).
    pub fn get(&self, asset_id: &str) -> Option<AssetEvaluation> {
        self.evaluations
            .get(&asset_id.to_uppercase())
            .map(|e| e.value().clone())
    }

    /// Filtered evaluations, strongest first, ties by asset id.
    pub fn all(&self, filter: &SignalFilter) -> Vec<AssetEvaluation> {
        let mut results: Vec<AssetEvaluation> = self
            .evaluations
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();

        results.sort_by(|a, b| {
            b.signal
                .strength
                .total_cmp(&a.signal.strength)
                .then_with(|| a.asset_id.cmp(&b.asset_id))
        });

        results
    }

    /// Totals by overall direction and confidence plus the last cycle report.
    pub fn summary(&self) -> SignalSummary {
        let mut counts = DirectionCounts::default();
        let (mut confirmed_bullish, mut confirmed_bearish, mut weak) = (0, 0, 0);

        for entry in self.evaluations.iter() {
            let signal = &entry.value().signal;
            counts.record(signal.overall);
            match signal.confidence {
                Confidence::ConfirmedBullish => confirmed_bullish += 1,
                Confidence::ConfirmedBearish => confirmed_bearish += 1,
                Confidence::WeakBullish | Confidence::WeakBearish => weak += 1,
                Confidence::Neutral => {}
            }
        }

        SignalSummary {
            bullish: counts.bullish,
            bearish: counts.bearish,
            neutral: counts.neutral,
            total: counts.total(),
            confirmed_bullish,
            confirmed_bearish,
            weak,
            last_cycle: self.last_cycle(),
        }
    }

    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }
}
