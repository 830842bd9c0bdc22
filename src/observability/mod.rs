//! Metrics collection and exposition.
//!
//! Request metrics go through the `metrics` facade; the Prometheus recorder
//! renders them for the separate metrics listener. Without an installed
//! recorder every call here is a no-op, which is what unit tests rely on.
//!
//! # Metrics
//! - `http_requests_total` (counter): host, method, code, route
//! - `http_request_duration_seconds` (histogram): host, method, route
//! - `http_active_connections` (gauge)
//! - `static_assets_cached`, `static_assets_bytes` (gauges): host

mod endpoint;

pub use endpoint::handle_metrics_request;

use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::assets::AssetCache;
use crate::routing::DomainRoute;

const REQUESTS_TOTAL: &str = "http_requests_total";
const REQUEST_DURATION: &str = "http_request_duration_seconds";
const ACTIVE_CONNECTIONS: &str = "http_active_connections";
const ASSETS_CACHED: &str = "static_assets_cached";
const ASSETS_BYTES: &str = "static_assets_bytes";

/// Prometheus client default buckets
const DURATION_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// How often histogram samples are folded into buckets
pub const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Install the process-wide Prometheus recorder
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets(&DURATION_BUCKETS)?
        .install_recorder()?;

    metrics::describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests.");
    metrics::describe_histogram!(
        REQUEST_DURATION,
        metrics::Unit::Seconds,
        "HTTP request duration in seconds."
    );
    metrics::describe_gauge!(ACTIVE_CONNECTIONS, "Open client connections.");
    metrics::describe_gauge!(ASSETS_CACHED, "Static files held in memory per domain.");
    metrics::describe_gauge!(ASSETS_BYTES, "Bytes of static files held in memory per domain.");

    Ok(handle)
}

/// Record one finished request
pub fn record_request(host: &str, method: &str, status: u16, route: &str, elapsed: Duration) {
    let host = if host.is_empty() { "unknown" } else { host };
    metrics::counter!(
        REQUESTS_TOTAL,
        "host" => host.to_string(),
        "method" => method.to_ascii_uppercase(),
        "code" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    metrics::histogram!(
        REQUEST_DURATION,
        "host" => host.to_string(),
        "method" => method.to_ascii_uppercase(),
        "route" => route.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn connection_opened() {
    metrics::gauge!(ACTIVE_CONNECTIONS).increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!(ACTIVE_CONNECTIONS).decrement(1.0);
}

/// Publish per-domain cache sizes once after the cache is built
#[allow(clippy::cast_precision_loss)]
pub fn record_asset_cache(domains: &[DomainRoute], assets: &AssetCache) {
    for domain in domains {
        let stats = assets.domain_stats(&domain.host);
        metrics::gauge!(ASSETS_CACHED, "host" => domain.host.clone()).set(stats.files as f64);
        metrics::gauge!(ASSETS_BYTES, "host" => domain.host.clone()).set(stats.bytes as f64);
    }
}
