//! Hand-rolled Prometheus text exposition, grounded on the teacher's
//! `memory-core/src/monitoring/metrics.rs` (`MetricsRegistry` +
//! `OperationLatency`'s "simple, not statistically rigorous" percentile
//! tracking, kept deliberately lightweight here too).

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Request counters plus the gauges named in spec.md §6's `/metrics`
/// surface.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    requests_total: AtomicU64,
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    latency: RwLock<LatencyStats>,
}

#[derive(Debug, Default, Clone, Copy)]
struct LatencyStats {
    count: u64,
    total_ms: u64,
    p99_ms: u64,
}

impl MetricsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed request's outcome and latency.
    pub fn record(&self, success: bool, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }
        let mut stats = self.latency.write();
        stats.count += 1;
        stats.total_ms += latency_ms;
        stats.p99_ms = stats.p99_ms.max(latency_ms);
    }

    #[must_use]
    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    fn avg_latency_ms(&self) -> u64 {
        let stats = self.latency.read();
        if stats.count == 0 { 0 } else { stats.total_ms / stats.count }
    }

    fn p99_latency_ms(&self) -> u64 {
        self.latency.read().p99_ms
    }

    /// Render the Prometheus text exposition format, given the current
    /// node count (pulled from the `Hierarchy` by the caller).
    #[must_use]
    pub fn export(&self, nodes_indexed: u64) -> String {
        let mut out = String::with_capacity(512);
        let memory_bytes = nodes_indexed.saturating_mul(256); // rough, node-table-sized estimate

        writeln!(out, "# HELP memory_service_requests_total Total RPC requests handled").ok();
        writeln!(out, "# TYPE memory_service_requests_total counter").ok();
        writeln!(out, "memory_service_requests_total {}", self.requests_total()).ok();

        writeln!(out, "# HELP memory_service_requests_success Requests that returned Ok").ok();
        writeln!(out, "# TYPE memory_service_requests_success counter").ok();
        writeln!(
            out,
            "memory_service_requests_success {}",
            self.requests_success.load(Ordering::Relaxed)
        )
        .ok();

        writeln!(out, "# HELP memory_service_requests_error Requests that returned an RPC error").ok();
        writeln!(out, "# TYPE memory_service_requests_error counter").ok();
        writeln!(
            out,
            "memory_service_requests_error {}",
            self.requests_error.load(Ordering::Relaxed)
        )
        .ok();

        writeln!(out, "# HELP memory_service_latency_avg_ms Average request latency").ok();
        writeln!(out, "# TYPE memory_service_latency_avg_ms gauge").ok();
        writeln!(out, "memory_service_latency_avg_ms {}", self.avg_latency_ms()).ok();

        writeln!(out, "# HELP memory_service_latency_p99_ms Approximate p99 request latency").ok();
        writeln!(out, "# TYPE memory_service_latency_p99_ms gauge").ok();
        writeln!(out, "memory_service_latency_p99_ms {}", self.p99_latency_ms()).ok();

        writeln!(out, "# HELP memory_service_nodes_indexed Total hierarchy nodes").ok();
        writeln!(out, "# TYPE memory_service_nodes_indexed gauge").ok();
        writeln!(out, "memory_service_nodes_indexed {nodes_indexed}").ok();

        writeln!(out, "# HELP memory_service_memory_bytes Approximate resident node-table bytes").ok();
        writeln!(out, "# TYPE memory_service_memory_bytes gauge").ok();
        writeln!(out, "memory_service_memory_bytes {memory_bytes}").ok();

        out
    }
}
