//! Prometheus metrics for peer sessions.
//!
//! All metrics follow the naming convention: `cf_<subsystem>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., records_signed_total)
//! - **Gauge**: Value that can go up or down (e.g., connection_unstable)
//! - **Histogram**: Distribution of values (e.g., health_latency_ms)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CHAIN METRICS (CF-01)
    // =========================================================================

    /// Local records signed and chained
    pub static ref RECORDS_SIGNED: Counter = Counter::new(
        "cf_chain_records_signed_total",
        "Total number of local records signed"
    ).expect("metric creation failed");

    /// Remote records discarded
    pub static ref RECORDS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("cf_chain_records_rejected_total", "Remote records rejected"),
        &["reason"]  // signature_invalid/self_signed/hash_mismatch/sequence_regression
    ).expect("metric creation failed");

    /// Flags raised on admitted records
    pub static ref CHAIN_FLAGS: CounterVec = CounterVec::new(
        Opts::new("cf_chain_flags_total", "Flags raised on admitted remote records"),
        &["flag"]  // sequence_gap/possible_desync
    ).expect("metric creation failed");

    /// Signer failures (tick skipped)
    pub static ref SIGNER_FAILURES: Counter = Counter::new(
        "cf_chain_signer_failures_total",
        "Signing attempts that failed and released their sequence"
    ).expect("metric creation failed");

    // =========================================================================
    // SYNC METRICS (CF-02)
    // =========================================================================

    /// Snapshots sent to the peer
    pub static ref SNAPSHOTS_EMITTED: Counter = Counter::new(
        "cf_sync_snapshots_emitted_total",
        "Total local snapshots sent to the peer"
    ).expect("metric creation failed");

    /// Waiting snapshots replaced before they could be signed
    pub static ref SNAPSHOTS_SUPERSEDED: Counter = Counter::new(
        "cf_sync_snapshots_superseded_total",
        "Snapshots replaced by a newer one while a signature was outstanding"
    ).expect("metric creation failed");

    // =========================================================================
    // CONNECTION HEALTH METRICS (CF-04)
    // =========================================================================

    /// Heartbeat round trip
    pub static ref HEALTH_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "cf_health_latency_ms",
            "Ping/pong round trip in milliseconds"
        ).buckets(exponential_buckets(5.0, 2.0, 12).unwrap_or_default())
    ).expect("metric creation failed");

    /// 1 while the link is unstable
    pub static ref CONNECTION_UNSTABLE: Gauge = Gauge::new(
        "cf_health_connection_unstable",
        "1 when no pong arrived within the timeout, else 0"
    ).expect("metric creation failed");

    // =========================================================================
    // TRANSPORT METRICS
    // =========================================================================

    /// Messages by direction and kind
    pub static ref PEER_MESSAGES: CounterVec = CounterVec::new(
        Opts::new("cf_transport_messages_total", "Peer messages by direction and kind"),
        &["direction", "kind"]  // direction: sent/received
    ).expect("metric creation failed");

    /// Frames that failed to decode
    pub static ref WIRE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("cf_transport_wire_errors_total", "Frames dropped by the wire codec"),
        &["kind"]
    ).expect("metric creation failed");
}

/// Handle proving the metrics were registered.
#[derive(Debug)]
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Number of collectors registered by this call.
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Chain
        Box::new(RECORDS_SIGNED.clone()),
        Box::new(RECORDS_REJECTED.clone()),
        Box::new(CHAIN_FLAGS.clone()),
        Box::new(SIGNER_FAILURES.clone()),
        // Sync
        Box::new(SNAPSHOTS_EMITTED.clone()),
        Box::new(SNAPSHOTS_SUPERSEDED.clone()),
        // Health
        Box::new(HEALTH_LATENCY.clone()),
        Box::new(CONNECTION_UNSTABLE.clone()),
        // Transport
        Box::new(PEER_MESSAGES.clone()),
        Box::new(WIRE_ERRORS.clone()),
    ];

    let mut registered = 0;
    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) => registered += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { registered })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
