//! Metrics and observability for Stirling
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::must_use_candidate)]

use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::error::{Error, Result};

/// Process-wide Prometheus recorder handle
static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Safe to call more than once.
pub fn install() -> Result<()> {
    HANDLE
        .get_or_try_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| Error::Internal(format!("Failed to install metrics recorder: {}", e)))
        })
        .map(|_| ())
}

// ============================================================================
// Store Metrics
// ============================================================================

/// Record one page fetched from the store
pub fn record_page_fetched(table: &str, entities: usize) {
    let table = table.to_string();
    counter!("stirling_store_pages_total", "table" => table.clone()).increment(1);
    counter!("stirling_store_entities_total", "table" => table).increment(entities as u64);
}

/// Record a failed page request
pub fn record_store_error(table: &str, kind: &str) {
    counter!("stirling_store_errors_total",
        "table" => table.to_string(),
        "kind" => kind.to_string()
    ).increment(1);
}

// ============================================================================
// Feed Metrics
// ============================================================================

/// Record a finished fix request
pub fn record_fix_request(success: bool, fixes: usize) {
    let status = if success { "success" } else { "error" };
    counter!("stirling_fix_requests_total", "status" => status).increment(1);
    if success {
        counter!("stirling_fixes_returned_total").increment(fixes as u64);
    }
}

// ============================================================================
// Export Functions
// ============================================================================

/// Export metrics in Prometheus format
#[must_use]
pub fn export_prometheus() -> String {
    match HANDLE.get() {
        Some(handle) => handle.render(),
        None => {
            tracing::warn!("Metrics requested before the recorder was installed");
            String::new()
        }
    }
}

/// Timer guard recording elapsed milliseconds into a histogram on drop
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    #[must_use]
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}
