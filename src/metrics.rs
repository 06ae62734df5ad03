use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once, from `main`.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("jobs_scraped_total", "Listings parsed from job boards.");
        describe_counter!("jobs_filtered_total", "Listings rejected by the keyword filter.");
        describe_counter!(
            "jobs_cache_dup_total",
            "Listings already emitted earlier in this process."
        );
        describe_counter!("jobs_delivered_total", "Job messages delivered.");
        describe_counter!(
            "site_request_errors_total",
            "Job board requests that failed or returned non-2xx."
        );
        describe_counter!("listing_parse_errors_total", "Listings skipped on parse errors.");
        describe_counter!("delivery_errors_total", "Job messages that failed to send.");
        describe_counter!("dedup_store_errors_total", "Dedup file read/write failures.");
        describe_counter!("delivery_cycles_total", "Completed delivery cycles.");
        describe_gauge!("dedup_store_size", "Identifiers in the dedup store.");
        describe_gauge!("delivery_last_run_ts", "Unix ts when a delivery cycle last finished.");
        describe_histogram!("site_parse_ms", "Listing page parse time in milliseconds.");
    });
}
