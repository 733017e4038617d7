use std::{
    collections::HashMap,
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use serde::Serialize;
use tracing::info;

/// Live counters for one labeled request channel.
#[derive(Default)]
pub struct RequestStats {
    requests: AtomicU64,
    failures: AtomicU64,
    latency_sum_micros: AtomicU64,
    latency_max_micros: AtomicU64,
}

impl RequestStats {
    fn record(&self, latency: Duration, failed: bool) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.requests.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        self.latency_sum_micros.fetch_add(micros, Ordering::Relaxed);
        self.latency_max_micros.fetch_max(micros, Ordering::Relaxed);
    }

    fn snapshot(&self, label: &str) -> ChannelReport {
        let requests = self.requests.load(Ordering::Relaxed);
        let sum_micros = self.latency_sum_micros.load(Ordering::Relaxed);
        let mean_latency = if requests == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(sum_micros / requests)
        };

        ChannelReport {
            label: label.to_owned(),
            requests,
            failures: self.failures.load(Ordering::Relaxed),
            mean_latency,
            max_latency: Duration::from_micros(self.latency_max_micros.load(Ordering::Relaxed)),
        }
    }
}

/// Registry of request channels keyed by submission label.
#[derive(Default)]
pub struct StatsRegistry {
    channels: RwLock<HashMap<String, Arc<RequestStats>>>,
}

impl StatsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, label: &str, latency: Duration) {
        self.channel(label).record(latency, false);
    }

    pub fn record_failure(&self, label: &str, latency: Duration) {
        self.channel(label).record(latency, true);
    }

    fn channel(&self, label: &str) -> Arc<RequestStats> {
        {
            let channels = self
                .channels
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(stats) = channels.get(label) {
                return Arc::clone(stats);
            }
        }

        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(channels.entry(label.to_owned()).or_default())
    }

    /// Snapshot every channel into an immutable report.
    #[must_use]
    pub fn report(&self) -> StatsReport {
        let channels = self
            .channels
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut snapshots: Vec<ChannelReport> = channels
            .iter()
            .map(|(label, stats)| stats.snapshot(label))
            .collect();
        snapshots.sort_by(|a, b| a.label.cmp(&b.label));
        StatsReport {
            channels: snapshots,
        }
    }
}

/// Final numbers for one labeled channel.
#[derive(Clone, Debug, Serialize)]
pub struct ChannelReport {
    pub label: String,
    pub requests: u64,
    pub failures: u64,
    pub mean_latency: Duration,
    pub max_latency: Duration,
}

impl ChannelReport {
    /// Share of requests that succeeded. A channel with no traffic counts as
    /// fully successful; expectations that need traffic check `requests`.
    #[must_use]
    pub fn success_ratio(&self) -> f64 {
        if self.requests == 0 {
            return 1.0;
        }
        let successes = self.requests.saturating_sub(self.failures);
        successes as f64 / self.requests as f64
    }
}

/// Immutable end-of-run snapshot, sorted by label.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StatsReport {
    channels: Vec<ChannelReport>,
}

impl StatsReport {
    #[must_use]
    pub fn channel(&self, label: &str) -> Option<&ChannelReport> {
        self.channels.iter().find(|c| c.label == label)
    }

    #[must_use]
    pub fn channels(&self) -> &[ChannelReport] {
        &self.channels
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.channels.iter().map(|c| c.requests).sum()
    }

    pub fn log_summary(&self) {
        for channel in &self.channels {
            info!(
                label = %channel.label,
                requests = channel.requests,
                failures = channel.failures,
                success_ratio = channel.success_ratio(),
                mean_latency_ms = channel.mean_latency.as_millis() as u64,
                max_latency_ms = channel.max_latency.as_millis() as u64,
                "request channel summary"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_aggregate_per_label() {
        let registry = StatsRegistry::new();
        registry.record_success("Mint", Duration::from_millis(10));
        registry.record_success("Mint", Duration::from_millis(20));
        registry.record_success("Mint", Duration::from_millis(30));
        registry.record_failure("Mint", Duration::from_millis(40));

        let report = registry.report();
        let channel = report.channel("Mint").unwrap();
        assert_eq!(channel.requests, 4);
        assert_eq!(channel.failures, 1);
        assert_eq!(channel.success_ratio(), 0.75);
        assert_eq!(channel.mean_latency, Duration::from_millis(25));
        assert_eq!(channel.max_latency, Duration::from_millis(40));
    }

    #[test]
    fn channels_are_isolated_and_sorted() {
        let registry = StatsRegistry::new();
        registry.record_success("b", Duration::from_millis(1));
        registry.record_failure("a", Duration::from_millis(1));

        let report = registry.report();
        let labels: Vec<&str> = report.channels().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(report.channel("a").unwrap().failures, 1);
        assert_eq!(report.channel("b").unwrap().failures, 0);
        assert_eq!(report.total_requests(), 2);
    }

    #[test]
    fn missing_channel_is_none_and_empty_ratio_is_vacuous() {
        let report = StatsRegistry::new().report();
        assert!(report.channel("Mint").is_none());

        let empty = ChannelReport {
            label: "empty".to_owned(),
            requests: 0,
            failures: 0,
            mean_latency: Duration::ZERO,
            max_latency: Duration::ZERO,
        };
        assert_eq!(empty.success_ratio(), 1.0);
    }
}
