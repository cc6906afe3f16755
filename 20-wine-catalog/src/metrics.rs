//! Periodic request metrics.
//!
//! The reporter samples the manager's counters through a snapshot command on
//! a fixed interval and logs what changed since the previous sample.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::command::CatalogHandle;

/// Point-in-time copy of the manager's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub requests: u64,
    pub successes: u64,
    pub errors: u64,
    pub wines: usize,
}

/// Activity between two consecutive snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalReport {
    pub requests: u64,
    pub successes: u64,
    pub errors: u64,
    /// Percentage of successful requests, `None` when nothing was requested.
    pub availability: Option<f64>,
    pub wines: usize,
}

impl IntervalReport {
    pub fn between(previous: &CounterSnapshot, current: &CounterSnapshot) -> Self {
        let requests = current.requests.saturating_sub(previous.requests);
        let successes = current.successes.saturating_sub(previous.successes);
        let errors = current.errors.saturating_sub(previous.errors);
        let availability = (requests > 0).then(|| successes as f64 / requests as f64 * 100.0);

        Self {
            requests,
            successes,
            errors,
            availability,
            wines: current.wines,
        }
    }
}

/// Logs an [`IntervalReport`] every `period` until the manager goes away.
pub async fn run_reporter(catalog: CatalogHandle, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    let mut previous = CounterSnapshot::default();
    loop {
        ticker.tick().await;

        let current = match catalog.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "metrics reporter stopping");
                break;
            }
        };

        log_report(&IntervalReport::between(&previous, &current));
        previous = current;
    }
}

fn log_report(report: &IntervalReport) {
    match report.availability {
        Some(availability) => info!(
            requests = report.requests,
            successes = report.successes,
            errors = report.errors,
            availability = %format!("{availability:.2}%"),
            wines = report.wines,
            "interval metrics"
        ),
        None => info!(
            requests = 0,
            wines = report.wines,
            "interval metrics: no requests this interval"
        ),
    }
}
