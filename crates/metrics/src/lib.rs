//! Thread-safe counters for the REST client.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Counters for requests issued by the REST client.
#[derive(Debug)]
pub struct ClientMetrics {
    // Counters
    requests_sent: AtomicU64,
    requests_succeeded: AtomicU64,
    requests_failed: AtomicU64,
    retries: AtomicU64,
    clock_resyncs: AtomicU64,
    limiter_waits: AtomicU64,

    // Timestamps
    inner: RwLock<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    start_time: Instant,
    last_success_time: Option<Instant>,
    last_failure_time: Option<Instant>,
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self {
            requests_sent: AtomicU64::new(0),
            requests_succeeded: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            clock_resyncs: AtomicU64::new(0),
            limiter_waits: AtomicU64::new(0),
            inner: RwLock::new(MetricsInner {
                start_time: Instant::now(),
                last_success_time: None,
                last_failure_time: None,
            }),
        }
    }

    // --- Increment methods ---

    /// One HTTP exchange attempted (retries count separately).
    pub fn inc_requests_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// A logical call returned a result.
    pub fn inc_requests_succeeded(&self) {
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_success_time = Some(Instant::now());
    }

    /// A logical call returned an error to its caller.
    pub fn inc_requests_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_failure_time = Some(Instant::now());
    }

    pub fn inc_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_clock_resyncs(&self) {
        self.clock_resyncs.fetch_add(1, Ordering::Relaxed);
    }

    /// The rate limiter suspended a caller.
    pub fn inc_limiter_waits(&self) {
        self.limiter_waits.fetch_add(1, Ordering::Relaxed);
    }

    // --- Getter methods ---

    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    pub fn requests_succeeded(&self) -> u64 {
        self.requests_succeeded.load(Ordering::Relaxed)
    }

    pub fn requests_failed(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    pub fn clock_resyncs(&self) -> u64 {
        self.clock_resyncs.load(Ordering::Relaxed)
    }

    pub fn limiter_waits(&self) -> u64 {
        self.limiter_waits.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.inner.read().start_time.elapsed().as_secs_f64()
    }

    pub fn secs_since_last_success(&self) -> Option<f64> {
        self.inner
            .read()
            .last_success_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    pub fn secs_since_last_failure(&self) -> Option<f64> {
        self.inner
            .read()
            .last_failure_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    /// Generate a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_sent: self.requests_sent(),
            requests_succeeded: self.requests_succeeded(),
            requests_failed: self.requests_failed(),
            retries: self.retries(),
            clock_resyncs: self.clock_resyncs(),
            limiter_waits: self.limiter_waits(),
            uptime_secs: self.uptime_secs(),
            secs_since_last_success: self.secs_since_last_success(),
            secs_since_last_failure: self.secs_since_last_failure(),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub requests_sent: u64,
    pub requests_succeeded: u64,
    pub requests_failed: u64,
    pub retries: u64,
    pub clock_resyncs: u64,
    pub limiter_waits: u64,
    pub uptime_secs: f64,
    pub secs_since_last_success: Option<f64>,
    pub secs_since_last_failure: Option<f64>,
}

/// Health status of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// No failures, or the most recent call succeeded.
    Healthy,
    /// The most recent call failed but earlier calls succeeded.
    Degraded,
    /// Calls have been made and none succeeded.
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "HEALTHY"),
            HealthStatus::Degraded => write!(f, "DEGRADED"),
            HealthStatus::Unhealthy => write!(f, "UNHEALTHY"),
        }
    }
}

impl MetricsSnapshot {
    /// Determine the health status from the most recent outcomes.
    pub fn health_status(&self) -> HealthStatus {
        match (self.secs_since_last_success, self.secs_since_last_failure) {
            (_, None) => HealthStatus::Healthy,
            (None, Some(_)) => HealthStatus::Unhealthy,
            // Smaller elapsed time means more recent
            (Some(success), Some(failure)) if success <= failure => HealthStatus::Healthy,
            (Some(_), Some(_)) => HealthStatus::Degraded,
        }
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Client Metrics ===")?;
        writeln!(f, "Uptime:              {:.1}s", self.uptime_secs)?;
        writeln!(f, "HTTP requests sent:  {}", self.requests_sent)?;
        writeln!(f, "Calls succeeded:     {}", self.requests_succeeded)?;
        writeln!(f, "Calls failed:        {}", self.requests_failed)?;
        writeln!(f, "Retries:             {}", self.retries)?;
        writeln!(f, "Clock resyncs:       {}", self.clock_resyncs)?;
        writeln!(f, "Rate limiter waits:  {}", self.limiter_waits)?;
        if let Some(secs) = self.secs_since_last_failure {
            writeln!(f, "Since last failure:  {:.1}s", secs)?;
        }
        Ok(())
    }
}

/// Shared handle to metrics.
pub type SharedMetrics = Arc<ClientMetrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(ClientMetrics::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(success: Option<f64>, failure: Option<f64>) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_sent: 10,
            requests_succeeded: 5,
            requests_failed: 5,
            retries: 0,
            clock_resyncs: 0,
            limiter_waits: 0,
            uptime_secs: 60.0,
            secs_since_last_success: success,
            secs_since_last_failure: failure,
        }
    }

    #[test]
    fn test_metrics_increment() {
        let metrics = ClientMetrics::new();

        metrics.inc_requests_sent();
        metrics.inc_requests_sent();
        metrics.inc_retries();
        metrics.inc_clock_resyncs();

        assert_eq!(metrics.requests_sent(), 2);
        assert_eq!(metrics.retries(), 1);
        assert_eq!(metrics.clock_resyncs(), 1);
        assert_eq!(metrics.limiter_waits(), 0);
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = ClientMetrics::new();

        metrics.inc_requests_succeeded();
        metrics.inc_requests_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_succeeded, 1);
        assert_eq!(snapshot.requests_failed, 1);
        assert!(snapshot.secs_since_last_failure.unwrap() < 1.0);
    }

    #[test]
    fn test_health_without_failures() {
        assert_eq!(snapshot_with(None, None).health_status(), HealthStatus::Healthy);
        assert_eq!(snapshot_with(Some(1.0), None).health_status(), HealthStatus::Healthy);
    }

    #[test]
    fn test_health_recovered_after_failure() {
        assert_eq!(
            snapshot_with(Some(1.0), Some(5.0)).health_status(),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn test_health_degraded_when_latest_failed() {
        assert_eq!(
            snapshot_with(Some(5.0), Some(1.0)).health_status(),
            HealthStatus::Degraded
        );
    }

    #[test]
    fn test_health_unhealthy_without_any_success() {
        assert_eq!(
            snapshot_with(None, Some(1.0)).health_status(),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn test_display_contains_counters() {
        let text = snapshot_with(None, None).to_string();
        assert!(text.contains("HTTP requests sent:  10"));
    }
}
