//! Resolution metrics with Prometheus text export

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Snapshot of resolver counters
#[derive(Debug, Clone, Default)]
pub struct ResolverMetrics {
    /// Completed resolutions, including fail-closed ones
    pub resolutions: u64,

    /// Resolutions that produced a staff role
    pub staff_resolutions: u64,

    /// Store errors that forced a fail-closed result
    pub store_failures: u64,

    /// Resolutions that hit the deadline
    pub timeouts: u64,

    /// Grant rows ignored because their role is unknown
    pub unknown_role_grants: u64,

    /// Permission checks refused by the privileged-action guard
    pub denials: u64,

    pub latency_p50_ms: f64,
    pub latency_p99_ms: f64,
    pub avg_latency_ms: f64,
}

impl ResolverMetrics {
    /// Share of resolutions that failed closed
    pub fn failure_rate(&self) -> f64 {
        if self.resolutions == 0 {
            0.0
        } else {
            (self.store_failures + self.timeouts) as f64 / self.resolutions as f64
        }
    }
}

/// Metrics collector shared by the resolver and the HTTP layer
#[derive(Clone)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<ResolverMetrics>>,

    /// Latency samples for percentile calculation
    latency_samples: Arc<RwLock<Vec<f64>>>,

    max_samples: usize,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(ResolverMetrics::default())),
            latency_samples: Arc::new(RwLock::new(Vec::with_capacity(1_024))),
            max_samples: 1_024,
        }
    }

    /// Record a finished resolution
    pub async fn record_resolution(&self, staff: bool, latency: Duration) {
        {
            let mut metrics = self.metrics.write().await;
            metrics.resolutions += 1;
            if staff {
                metrics.staff_resolutions += 1;
            }
        }
        self.record_latency(latency).await;
    }

    /// Record a store failure
    pub async fn record_store_failure(&self) {
        self.metrics.write().await.store_failures += 1;
    }

    /// Record a timeout
    pub async fn record_timeout(&self) {
        self.metrics.write().await.timeouts += 1;
    }

    /// Record ignored grant rows
    pub async fn record_unknown_roles(&self, count: u64) {
        if count > 0 {
            self.metrics.write().await.unknown_role_grants += count;
        }
    }

    /// Record a guard denial
    pub async fn record_denial(&self) {
        self.metrics.write().await.denials += 1;
    }

    async fn record_latency(&self, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;

        let mut samples = self.latency_samples.write().await;
        samples.push(latency_ms);

        if samples.len() > self.max_samples {
            let excess = samples.len() - self.max_samples;
            samples.drain(0..excess);
        }

        let mut sorted = samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut metrics = self.metrics.write().await;
        metrics.avg_latency_ms = sorted.iter().sum::<f64>() / sorted.len() as f64;
        metrics.latency_p50_ms = Self::percentile(&sorted, 0.50);
        metrics.latency_p99_ms = Self::percentile(&sorted, 0.99);
    }

    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }
        let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    /// Get current metrics snapshot
    pub async fn snapshot(&self) -> ResolverMetrics {
        self.metrics.read().await.clone()
    }

    /// Export metrics in Prometheus format
    pub async fn export_prometheus(&self) -> String {
        let metrics = self.metrics.read().await;

        format!(
            r#"# HELP access_resolutions_total Completed role resolutions
# TYPE access_resolutions_total counter
access_resolutions_total {}

# HELP access_staff_resolutions_total Resolutions that produced a staff role
# TYPE access_staff_resolutions_total counter
access_staff_resolutions_total {}

# HELP access_store_failures_total Store errors during resolution
# TYPE access_store_failures_total counter
access_store_failures_total {}

# HELP access_timeouts_total Resolutions that exceeded the deadline
# TYPE access_timeouts_total counter
access_timeouts_total {}

# HELP access_unknown_role_grants_total Grant rows ignored for unknown roles
# TYPE access_unknown_role_grants_total counter
access_unknown_role_grants_total {}

# HELP access_denials_total Privileged actions refused
# TYPE access_denials_total counter
access_denials_total {}

# HELP access_resolution_latency_seconds Resolution latency percentiles
# TYPE access_resolution_latency_seconds summary
access_resolution_latency_seconds{{quantile="0.5"}} {}
access_resolution_latency_seconds{{quantile="0.99"}} {}
"#,
            metrics.resolutions,
            metrics.staff_resolutions,
            metrics.store_failures,
            metrics.timeouts,
            metrics.unknown_role_grants,
            metrics.denials,
            metrics.latency_p50_ms / 1000.0,
            metrics.latency_p99_ms / 1000.0,
        )
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
