//! Evaluation cycle: fetch, classify, aggregate, detect flips, publish.

use crate::config::{AssetConfig, Config, TimeframeConfig};
use crate::error::{CycleError, SourceError};
use crate::services::notifier::Notifier;
use crate::services::signals::{aggregate, classify, FlipDetector, IndicatorCalculator, SignalStore};
use crate::services::snapshot_store::SnapshotStore;
use crate::sources::MarketDataProvider;
use crate::types::{
    AssetEvaluation, CycleReport, DirectionCounts, FlipEvent, IndicatorResult, SignalParams,
    TimeframeResult,
};
use dashmap::DashMap;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::time::{timeout, timeout_at, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Why an asset was left out of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    /// The asset's previous cycle still holds its guard.
    Busy,
    /// The fetch phase missed the cycle deadline.
    Deadline,
}

enum AssetOutcome {
    Evaluated {
        evaluation: AssetEvaluation,
        flip: Option<FlipEvent>,
    },
    Skipped(SkipReason),
}

/// Drives evaluation cycles over the configured watch list.
pub struct SignalEngine {
    provider: Arc<dyn MarketDataProvider>,
    detector: FlipDetector,
    notifiers: Vec<Arc<dyn Notifier>>,
    signal_store: Arc<SignalStore>,
    calculator: IndicatorCalculator,
    params: SignalParams,
    timeframes: Vec<TimeframeConfig>,
    assets: Vec<AssetConfig>,
    fetch_timeout: Duration,
    cycle_budget: Duration,
    guards: DashMap<String, Arc<Mutex<()>>>,
}

impl SignalEngine {
    pub fn new(
        config: &Config,
        provider: Arc<dyn MarketDataProvider>,
        snapshots: Arc<dyn SnapshotStore>,
        signal_store: Arc<SignalStore>,
    ) -> Self {
        Self {
            provider,
            detector: FlipDetector::new(snapshots),
            notifiers: Vec::new(),
            signal_store,
            calculator: IndicatorCalculator::new(&config.signal),
            params: config.signal,
            timeframes: config.timeframes.clone(),
            assets: config.assets.clone(),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            cycle_budget: Duration::from_secs(config.cycle_budget_secs),
            guards: DashMap::new(),
        }
    }

    /// Add a flip notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Override the per-request timeout.
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Override the fetch-phase budget for a whole cycle.
    pub fn with_cycle_budget(mut self, cycle_budget: Duration) -> Self {
        self.cycle_budget = cycle_budget;
        self
    }

    pub fn signal_store(&self) -> &Arc<SignalStore> {
        &self.signal_store
    }

    fn flatten<T>(
        &self,
        result: Result<Result<T, SourceError>, tokio::time::error::Elapsed>,
    ) -> Result<T, SourceError> {
        result.unwrap_or_else(|_| Err(SourceError::Timeout(self.fetch_timeout.as_secs())))
    }

    /// Fetch and classify every timeframe of one asset.
    ///
    /// Fetches run concurrently; a failed timeframe degrades to Neutral
    /// without affecting the others.
    pub async fn evaluate_asset(&self, asset: &AssetConfig) -> AssetEvaluation {
        let quote = async {
            self.flatten(timeout(self.fetch_timeout, self.provider.quote(&asset.id)).await)
        };
        let series = join_all(self.timeframes.iter().map(|tf| async move {
            self.flatten(timeout(self.fetch_timeout, self.provider.closes(&asset.id, tf)).await)
        }));

        let (quote, series) = tokio::join!(quote, series);

        let quote = match quote {
            Ok(q) => Some(q),
            Err(e) => {
                warn!("Quote unavailable for {}: {}", asset.id, e);
                None
            }
        };

        let mut timeframes = Vec::with_capacity(self.timeframes.len());
        let mut first_close = None;

        for (tf, result) in self.timeframes.iter().zip(series) {
            let (available, signal) = match result {
                Ok(series) => {
                    if first_close.is_none() {
                        first_close = series.last();
                    }
                    let indicators = self.calculator.run(&series);
                    (true, classify(&indicators, &self.params))
                }
                Err(e) => {
                    warn!("Series unavailable for {} {}: {}", asset.id, tf.key, e);
                    let mut signal = classify(&IndicatorResult::unavailable(), &self.params);
                    signal.reason = "series unavailable".to_string();
                    (false, signal)
                }
            };

            timeframes.push(TimeframeResult {
                timeframe: tf.key.clone(),
                label: tf.label.clone(),
                available,
                signal,
            });
        }

        let reachable = quote.is_some() || timeframes.iter().any(|t| t.available);
        let signals: Vec<_> = timeframes.iter().map(|t| t.signal.clone()).collect();
        let signal = aggregate(&signals);

        let reference_price = quote
            .map(|q| q.price)
            .or(first_close)
            .unwrap_or(0.0);

        debug!(
            "Evaluated {}: {} (strength {:.2})",
            asset.id, signal.confidence, signal.strength
        );

        AssetEvaluation {
            asset_id: asset.id.clone(),
            name: asset.name.clone(),
            price: quote.map(|q| q.price),
            change_24h_pct: quote.map(|q| q.change_24h_pct),
            timeframes,
            signal,
            reference_price,
            reachable,
            evaluated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    async fn run_asset(&self, asset: &AssetConfig, deadline: tokio::time::Instant) -> AssetOutcome {
        let guard = self
            .guards
            .entry(asset.id.clone())
            .or_insert_with(Default::default)
            .value()
            .clone();
        let Ok(_held) = guard.try_lock_owned() else {
            return AssetOutcome::Skipped(SkipReason::Busy);
        };

        let evaluation = match timeout_at(deadline, self.evaluate_asset(asset)).await {
            Ok(evaluation) => evaluation,
            Err(_) => return AssetOutcome::Skipped(SkipReason::Deadline),
        };

        // An outage must not overwrite the last real classification.
        let flip = if evaluation.reachable {
            self.detector
                .observe(&asset.id, &evaluation.signal, evaluation.reference_price)
                .await
        } else {
            None
        };

        self.signal_store.publish(evaluation.clone());

        AssetOutcome::Evaluated { evaluation, flip }
    }

    /// Run one evaluation cycle over every configured asset.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let started = Instant::now();
        let started_at = chrono::Utc::now().timestamp_millis();
        let deadline = tokio::time::Instant::now() + self.cycle_budget;

        let outcomes = join_all(self.assets.iter().map(|asset| self.run_asset(asset, deadline))).await;

        let mut report = CycleReport {
            started_at,
            duration_ms: 0,
            evaluated: Vec::new(),
            skipped: Vec::new(),
            unreachable: Vec::new(),
            flips: Vec::new(),
            counts: DirectionCounts::default(),
        };

        for (asset, outcome) in self.assets.iter().zip(outcomes) {
            match outcome {
                AssetOutcome::Evaluated { evaluation, flip } => {
                    if !evaluation.reachable {
                        report.unreachable.push(asset.id.clone());
                    }
                    report.counts.record(evaluation.signal.overall);
                    report.evaluated.push(asset.id.clone());
                    report.flips.extend(flip);
                }
                AssetOutcome::Skipped(reason) => {
                    warn!("Skipped {} this cycle: {:?}", asset.id, reason);
                    report.skipped.push(asset.id.clone());
                }
            }
        }

        for event in &report.flips {
            for notifier in &self.notifiers {
                notifier.notify(event).await;
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        self.signal_store.record_cycle(report.clone());

        if !self.assets.is_empty() && report.unreachable.len() == self.assets.len() {
            return Err(CycleError::ProviderUnreachable(self.assets.len()));
        }

        Ok(report)
    }

    /// Run cycles every `interval` until `shutdown` flips to true.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Signal engine started: {} assets x {} timeframes every {}s",
            self.assets.len(),
            self.timeframes.len(),
            interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(report) => info!(
                            "Cycle complete in {}ms: {} evaluated, {} skipped, {} unreachable, {} flips ({} bullish / {} bearish / {} neutral)",
                            report.duration_ms,
                            report.evaluated.len(),
                            report.skipped.len(),
                            report.unreachable.len(),
                            report.flips.len(),
                            report.counts.bullish,
                            report.counts.bearish,
                            report.counts.neutral
                        ),
                        Err(e) => error!("Cycle failed: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Signal engine stopped");
    }
}
