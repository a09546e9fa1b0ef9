//! # Gateway Metrics
//!
//! Counter dan histogram thread-safe untuk front door dan upstream client,
//! diekspor dalam format Prometheus di `GET /metrics`.
//!
//! ## Metrics
//!
//! - `ops_gateway_requests_total`: request masuk
//! - `ops_gateway_requests_by_status`: request per HTTP status
//! - `ops_gateway_request_latency_ms`: latency end-to-end per request
//! - `ops_gateway_upstream_requests_total` / `..._failures_total`
//! - `ops_gateway_stale_cache_hits_total`: 429 yang dijawab dari cache
//! - `ops_gateway_snapshot_fallbacks_total`: snapshot primary tidak terpakai
//! - `ops_gateway_leader_fallbacks_total`: leader tidak ditemukan, pakai default base

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

// ════════════════════════════════════════════════════════════════════════════
// COUNTER
// ════════════════════════════════════════════════════════════════════════════

/// Monotonic atomic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HISTOGRAM
// ════════════════════════════════════════════════════════════════════════════

const BUCKET_COUNT: usize = Histogram::BUCKET_BOUNDS.len() + 1;

/// Bucketed latency histogram (milliseconds). The last bucket is `+Inf`.
pub struct Histogram {
    buckets: [AtomicU64; BUCKET_COUNT],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    pub const BUCKET_BOUNDS: [u64; 10] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000];

    pub fn new() -> Self {
        Self {
            buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, value_ms: u64) {
        self.sum.fetch_add(value_ms, Ordering::SeqCst);
        self.count.fetch_add(1, Ordering::SeqCst);
        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| value_ms <= bound)
            .unwrap_or(BUCKET_COUNT - 1);
        self.buckets[idx].fetch_add(1, Ordering::SeqCst);
    }

    /// Observations `<=` the bound at `idx`; `idx` past the bounds is `+Inf`.
    pub fn cumulative(&self, idx: usize) -> u64 {
        self.buckets[..=idx.min(BUCKET_COUNT - 1)]
            .iter()
            .map(|b| b.load(Ordering::SeqCst))
            .sum()
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::SeqCst)
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Histogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Histogram")
            .field("count", &self.count())
            .field("sum", &self.sum())
            .finish()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// STATUS CODE COUNTERS
// ════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct StatusCodeCounters {
    counters: RwLock<HashMap<u16, Counter>>,
}

impl StatusCodeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, status: u16) {
        // fast path: status already seen
        if let Some(counter) = self.counters.read().get(&status) {
            counter.inc();
            return;
        }
        self.counters.write().entry(status).or_default().inc();
    }

    pub fn get(&self, status: u16) -> u64 {
        self.counters.read().get(&status).map(Counter::get).unwrap_or(0)
    }

    /// All `(status, count)` pairs sorted by status.
    pub fn snapshot(&self) -> Vec<(u16, u64)> {
        let mut all: Vec<(u16, u64)> = self
            .counters
            .read()
            .iter()
            .map(|(&status, counter)| (status, counter.get()))
            .collect();
        all.sort_by_key(|(status, _)| *status);
        all
    }
}

impl std::fmt::Debug for StatusCodeCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusCodeCounters")
            .field("counters", &self.snapshot())
            .finish()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TRACE ID
// ════════════════════════════════════════════════════════════════════════════

/// Per-request trace id, format `{micros_hex}-{seq_hex}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(String);

impl TraceId {
    pub fn generate() -> Self {
        static SEQ: AtomicU64 = AtomicU64::new(0);

        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        let seq = SEQ.fetch_add(1, Ordering::SeqCst);

        Self(format!("{:x}-{:04x}", micros, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// REQUEST CONTEXT
// ════════════════════════════════════════════════════════════════════════════

/// Tracing context for a single inbound request.
#[derive(Debug)]
pub struct RequestContext {
    pub trace_id: TraceId,
    pub started: Instant,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            trace_id: TraceId::generate(),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GATEWAY METRICS
// ════════════════════════════════════════════════════════════════════════════

/// Shared metrics registry, held as `Arc<GatewayMetrics>` by the app state
/// and the upstream client.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    pub requests_total: Counter,
    pub requests_by_status: StatusCodeCounters,
    pub request_latency: Histogram,
    pub upstream_requests: Counter,
    pub upstream_failures: Counter,
    pub stale_cache_hits: Counter,
    pub snapshot_fallbacks: Counter,
    pub leader_fallbacks: Counter,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished inbound request.
    pub fn record_response(&self, status: u16, latency_ms: u64) {
        self.requests_total.inc();
        self.requests_by_status.inc(status);
        self.request_latency.observe(latency_ms);
    }

    pub fn record_upstream(&self, ok: bool) {
        self.upstream_requests.inc();
        if !ok {
            self.upstream_failures.inc();
        }
    }

    /// Render in Prometheus exposition format.
    pub fn to_prometheus(&self) -> String {
        let mut out = String::with_capacity(4096);

        write_counter(
            &mut out,
            "ops_gateway_requests_total",
            "Total inbound requests",
            self.requests_total.get(),
        );

        let _ = writeln!(out, "# HELP ops_gateway_requests_by_status Inbound requests by HTTP status");
        let _ = writeln!(out, "# TYPE ops_gateway_requests_by_status counter");
        for (status, count) in self.requests_by_status.snapshot() {
            let _ = writeln!(out, "ops_gateway_requests_by_status{{status=\"{}\"}} {}", status, count);
        }
        let _ = writeln!(out);

        let name = "ops_gateway_request_latency_ms";
        let _ = writeln!(out, "# HELP {name} Request latency in milliseconds");
        let _ = writeln!(out, "# TYPE {name} histogram");
        for (i, bound) in Histogram::BUCKET_BOUNDS.iter().enumerate() {
            let _ = writeln!(out, "{name}_bucket{{le=\"{}\"}} {}", bound, self.request_latency.cumulative(i));
        }
        let _ = writeln!(out, "{name}_bucket{{le=\"+Inf\"}} {}", self.request_latency.cumulative(BUCKET_COUNT - 1));
        let _ = writeln!(out, "{name}_sum {}", self.request_latency.sum());
        let _ = writeln!(out, "{name}_count {}", self.request_latency.count());
        let _ = writeln!(out);

        write_counter(
            &mut out,
            "ops_gateway_upstream_requests_total",
            "Upstream HTTP requests issued",
            self.upstream_requests.get(),
        );
        write_counter(
            &mut out,
            "ops_gateway_upstream_failures_total",
            "Upstream requests that failed or returned non-2xx",
            self.upstream_failures.get(),
        );
        write_counter(
            &mut out,
            "ops_gateway_stale_cache_hits_total",
            "Rate-limited upstream responses served from cache",
            self.stale_cache_hits.get(),
        );
        write_counter(
            &mut out,
            "ops_gateway_snapshot_fallbacks_total",
            "Snapshot reads served by the fallback path",
            self.snapshot_fallbacks.get(),
        );
        write_counter(
            &mut out,
            "ops_gateway_leader_fallbacks_total",
            "Leader lookups that fell back to the default upstream",
            self.leader_fallbacks.get(),
        );

        out
    }
}

fn write_counter(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {value}");
    let _ = writeln!(out);
}

// ════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════
