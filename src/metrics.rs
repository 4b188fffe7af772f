//! Pipeline metrics.
//!
//! Counters and histograms go through the `metrics` facade and are no-ops
//! until a recorder is installed (see [`install_prometheus_exporter`]).

use std::net::SocketAddr;
use tracing::info;

use crate::error::{CatalogError, Result};

pub struct CatalogMetrics;

impl CatalogMetrics {
    pub fn record_fetch_success(source_id: &str, bytes: usize) {
        ::metrics::counter!("rso_catalog_fetch_success_total", "source" => source_id.to_string()).increment(1);
        ::metrics::histogram!("rso_catalog_fetch_bytes", "source" => source_id.to_string()).record(bytes as f64);
    }

    pub fn record_fetch_failure(source_id: &str) {
        ::metrics::counter!("rso_catalog_fetch_failure_total", "source" => source_id.to_string()).increment(1);
    }

    pub fn record_load_failure(source_id: &str) {
        ::metrics::counter!("rso_catalog_load_failure_total", "source" => source_id.to_string()).increment(1);
    }

    pub fn record_rows(source_id: &str, rows: usize, malformed: usize) {
        ::metrics::counter!("rso_catalog_rows_total", "source" => source_id.to_string()).increment(rows as u64);
        ::metrics::counter!("rso_catalog_malformed_rows_total", "source" => source_id.to_string())
            .increment(malformed as u64);
    }

    pub fn record_rejections(source_id: &str, invalid: usize, missing_object_id: usize) {
        ::metrics::counter!("rso_catalog_invalid_records_total", "source" => source_id.to_string())
            .increment(invalid as u64);
        ::metrics::counter!("rso_catalog_keyless_records_total", "source" => source_id.to_string())
            .increment(missing_object_id as u64);
    }

    pub fn record_reconciliation(objects: usize, replacements: usize, unresolved: usize) {
        ::metrics::gauge!("rso_catalog_reconciled_objects").set(objects as f64);
        ::metrics::counter!("rso_catalog_champion_replacements_total").increment(replacements as u64);
        ::metrics::counter!("rso_catalog_unresolved_source_drops_total").increment(unresolved as u64);
    }

    pub fn record_run_duration(duration_secs: f64) {
        ::metrics::histogram!("rso_catalog_run_duration_seconds").record(duration_secs);
    }
}

/// Serve Prometheus metrics on `addr`. Must run inside a tokio runtime.
pub fn install_prometheus_exporter(addr: SocketAddr) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| CatalogError::Config(format!("failed to install metrics exporter: {}", e)))?;
    info!("Prometheus exporter listening on http://{}/metrics", addr);
    Ok(())
}
