//! Request and phase timing collection.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingStat {
    pub count: u64,
    pub total_ms: f64,
    pub average_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlowestRequest {
    pub url: String,
    pub ms: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub total_ms: f64,
    pub total_kb: f64,
    pub slowest_request: SlowestRequest,
    pub timings: BTreeMap<String, BTreeMap<String, TimingStat>>,
    pub average_request_ms: f64,
}

#[derive(Default)]
pub struct Metrics {
    inner: Mutex<MetricsSnapshot>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MetricsSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_timing(&self, category: &str, operation: &str, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        let mut inner = self.lock();
        let stat = inner
            .timings
            .entry(category.to_string())
            .or_default()
            .entry(operation.to_string())
            .or_default();
        stat.count += 1;
        stat.total_ms += ms;
        stat.average_ms = stat.total_ms / stat.count as f64;
    }

    pub fn record_request(&self, url: &str, elapsed: Duration, bytes: usize) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        let mut inner = self.lock();
        inner.requests += 1;
        inner.total_ms += ms;
        inner.total_kb += bytes as f64 / 1024.0;
        inner.average_request_ms = inner.total_ms / inner.requests as f64;
        if ms > inner.slowest_request.ms {
            inner.slowest_request = SlowestRequest {
                url: url.to_string(),
                ms,
            };
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().clone()
    }

    pub fn reset(&self) {
        *self.lock() = MetricsSnapshot::default();
    }

    pub fn log_summary(&self) -> MetricsSnapshot {
        let snapshot = self.snapshot();
        info!(
            requests = snapshot.requests,
            total_ms = %format!("{:.2}", snapshot.total_ms),
            average_ms = %format!("{:.2}", snapshot.average_request_ms),
            total_kb = %format!("{:.2}", snapshot.total_kb),
            slowest_url = %snapshot.slowest_request.url,
            slowest_ms = %format!("{:.2}", snapshot.slowest_request.ms),
            "upstream request metrics"
        );
        for (category, operations) in &snapshot.timings {
            for (operation, stat) in operations {
                info!(
                    category = %category,
                    operation = %operation,
                    calls = stat.count,
                    average_ms = %format!("{:.2}", stat.average_ms),
                    "timing"
                );
            }
        }
        snapshot
    }
}
