//! One evaluation cycle over every configured instrument
//!
//! Instruments run concurrently up to `max_concurrent_instruments`. A failed
//! fetch or a failed delivery is logged and stays local to its instrument.

use crate::config::MonitorConfig;
use crate::engine::TrendEngine;
use crate::error::SignalError;
use crate::notify::{AlertFormatter, NotificationSink};
use crate::provider::MarketDataProvider;
use crate::signals::{AggregationResult, CycleOutcome};
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::time::Instant;

/// What one cycle produced
#[derive(Debug)]
pub struct CycleReport {
    /// Per-instrument outcome, in completion order
    pub results: Vec<(String, Result<AggregationResult, SignalError>)>,
    pub aligned: usize,
    pub suggested: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
}

impl CycleReport {
    pub fn result_for(&self, symbol: &str) -> Option<&Result<AggregationResult, SignalError>> {
        self.results.iter().find(|(s, _)| s == symbol).map(|(_, r)| r)
    }
}

/// Evaluate every instrument once and deliver alerts for aligned results
pub async fn run_cycle(
    config: &MonitorConfig,
    engine: &TrendEngine,
    provider: &dyn MarketDataProvider,
    sink: &dyn NotificationSink,
    formatter: &AlertFormatter,
) -> CycleReport {
    let started = Instant::now();
    info!("=== Evaluation cycle: {} instruments ===", config.instruments.len());

    let results: Vec<(String, Result<AggregationResult, SignalError>)> =
        stream::iter(config.instruments.iter())
            .map(|symbol| async move { (symbol.clone(), engine.analyze(symbol, provider).await) })
            .buffer_unordered(config.max_concurrent_instruments)
            .collect()
            .await;

    let mut report = CycleReport {
        results: Vec::with_capacity(results.len()),
        aligned: 0,
        suggested: 0,
        delivered: 0,
        delivery_failures: 0,
    };

    for (symbol, result) in results {
        let analysis = match &result {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("{}: skipped this cycle: {}", symbol, e);
                report.results.push((symbol, result));
                continue;
            }
        };

        match analysis.outcome() {
            CycleOutcome::NotAligned => {
                debug!("{}: not aligned", symbol);
            }
            CycleOutcome::NoSuggestion => {
                report.aligned += 1;
                info!("{}: aligned, no suggestion", symbol);
            }
            CycleOutcome::Suggested(tier) => {
                report.aligned += 1;
                report.suggested += 1;
                if let Some(suggestion) = analysis.suggestion() {
                    info!(
                        "{}: suggest {} score={:.2} confidence={:.2} tier={:?}",
                        symbol, suggestion.direction, suggestion.score, suggestion.confidence, tier
                    );
                }
            }
        }

        if config.notifier.enabled {
            if let Some(alert) = formatter.render(analysis) {
                match sink.deliver(&alert).await {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        report.delivery_failures += 1;
                        error!("{}: failed to deliver alert: {:#}", symbol, e);
                    }
                }
            }
        }
        report.results.push((symbol, result));
    }

    info!(
        "Cycle finished in {:.1}s: {} aligned, {} suggestions, {} alerts sent",
        started.elapsed().as_secs_f64(),
        report.aligned,
        report.suggested,
        report.delivered
    );
    report
}
