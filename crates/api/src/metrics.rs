use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Timing (in microseconds)
    total_review_time_us: AtomicU64,

    // Counts
    total_flags_emitted: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            total_review_time_us: AtomicU64::new(0),
            total_flags_emitted: AtomicUsize::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_review(&self, duration: std::time::Duration, flags: usize) {
        self.total_review_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_flags_emitted.fetch_add(flags, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let successful = self.successful_requests.load(Ordering::Relaxed);
        let total_us = self.total_review_time_us.load(Ordering::Relaxed) as f64;

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: successful,
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_review_time_ms: if successful > 0 {
                total_us / successful as f64 / 1000.0 // Convert to ms
            } else {
                0.0
            },
            total_flags_emitted: self.total_flags_emitted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub avg_review_time_ms: f64,
    pub total_flags_emitted: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_snapshot_averages_successful_reviews() {
        let metrics = Metrics::new();
        metrics.record_request(true);
        metrics.record_review(Duration::from_millis(30), 2);
        metrics.record_request(true);
        metrics.record_review(Duration::from_millis(10), 1);
        metrics.record_request(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.successful_requests, 2);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.total_flags_emitted, 3);
        assert!((snapshot.avg_review_time_ms - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_snapshot() {
        assert_eq!(Metrics::new().snapshot().avg_review_time_ms, 0.0);
    }
}
