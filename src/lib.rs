// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod delivery;
pub mod jobs;
pub mod metrics;
pub mod notify;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::delivery::{DeliveryLoop, DeliverySettings};
pub use crate::jobs::types::{JobId, JobRecord, Stage, StageFailure, StageOutcome};
pub use crate::notify::Notifier;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::jobs::fetch::PageFetcher;
use crate::jobs::filter::KeywordFilter;
use crate::jobs::JobParser;
use crate::store::DedupStore;

/// Wire parser, store and notifier from configuration. Fails only on
/// configuration errors (unknown site, bad selector or base URL).
pub fn build_delivery_loop(
    cfg: &AppConfig,
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<DeliveryLoop> {
    let extractors = jobs::sites::build_extractors(&cfg.sites)?;
    let parser = JobParser::new(
        extractors,
        fetcher,
        KeywordFilter::from_config(&cfg.filters),
        cfg.site_delay(),
    );
    Ok(DeliveryLoop::new(
        Arc::new(parser),
        DedupStore::new(cfg.state_path.clone()),
        notifier,
        DeliverySettings {
            queries: cfg.search_queries.clone(),
            send_delay: cfg.send_delay(),
            interval: cfg.parsing_interval(),
        },
    ))
}
