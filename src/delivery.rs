// src/delivery.rs
//! One delivery cycle: load the dedup store, scrape every query, send what is
//! new, persist once. Cycles never overlap; see [`DeliveryLoop::try_run_once`].

use metrics::{counter, gauge};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::jobs::types::{JobId, JobRecord, Stage, StageOutcome};
use crate::jobs::JobParser;
use crate::notify::{format_job_message, Notifier};
use crate::store::DedupStore;

#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub queries: Vec<String>,
    /// Pause after each delivered message.
    pub send_delay: Duration,
    /// Pause between scheduled cycles.
    pub interval: Duration,
}

pub struct DeliveryLoop {
    parser: Arc<JobParser>,
    store: DedupStore,
    notifier: Arc<dyn Notifier>,
    settings: DeliverySettings,
    cycle: Mutex<()>,
}

impl DeliveryLoop {
    pub fn new(
        parser: Arc<JobParser>,
        store: DedupStore,
        notifier: Arc<dyn Notifier>,
        settings: DeliverySettings,
    ) -> Self {
        Self {
            parser,
            store,
            notifier,
            settings,
            cycle: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &DeliverySettings {
        &self.settings
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    pub fn parser(&self) -> &JobParser {
        &self.parser
    }

    /// True while a cycle holds the lock.
    pub fn is_running(&self) -> bool {
        self.cycle.try_lock().is_err()
    }

    /// Run one cycle, waiting for a running one to finish first.
    pub async fn run_once(&self) -> Vec<JobRecord> {
        let _guard = self.cycle.lock().await;
        self.cycle_locked().await
    }

    /// Run one cycle unless one is already in progress (`None`).
    pub async fn try_run_once(&self) -> Option<Vec<JobRecord>> {
        let _guard = self.cycle.try_lock().ok()?;
        Some(self.cycle_locked().await)
    }

    async fn cycle_locked(&self) -> Vec<JobRecord> {
        crate::metrics::ensure_metrics_described();
        let mut sent: HashSet<JobId> = self.store.load().await;
        let mut delivered = Vec::new();

        for query in &self.settings.queries {
            // each query scrapes on its own task
            let parser = Arc::clone(&self.parser);
            let q = query.clone();
            let jobs = match tokio::spawn(async move { parser.parse_all_sites(&q).await }).await {
                Ok(jobs) => jobs,
                Err(e) => {
                    tracing::error!(query = %query, error = %e, "scrape task failed");
                    continue;
                }
            };

            for job in jobs {
                let id = job.id();
                if sent.contains(&id) {
                    continue;
                }
                match self.deliver(&job).await {
                    StageOutcome::Success(()) => {
                        tracing::info!(title = %job.title, source = %job.source, job_id = %id, "job delivered");
                        counter!("jobs_delivered_total").increment(1);
                        sent.insert(id);
                        delivered.push(job);
                        if !self.settings.send_delay.is_zero() {
                            tokio::time::sleep(self.settings.send_delay).await;
                        }
                    }
                    StageOutcome::Failure(f) => {
                        counter!("delivery_errors_total").increment(1);
                        f.log();
                        // retried next cycle
                        self.parser.forget(&id);
                    }
                }
            }
        }

        // once per cycle, whatever happened to individual messages
        let saved = self.store.save(&sent).await.is_success();

        counter!("delivery_cycles_total").increment(1);
        gauge!("dedup_store_size").set(sent.len() as f64);
        gauge!("delivery_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        tracing::info!(
            delivered = delivered.len(),
            tracked = sent.len(),
            saved,
            "delivery cycle finished"
        );

        delivered
    }

    async fn deliver(&self, job: &JobRecord) -> StageOutcome<()> {
        let text = format_job_message(job);
        StageOutcome::from_result(
            self.notifier.send(&text).await,
            Stage::Delivery,
            format!("{} via {}", job.id(), self.notifier.name()),
        )
    }

    /// Cycle forever: run, then wait `interval`. A panicking cycle is logged
    /// and the next one still runs on schedule.
    pub async fn run_forever(self: Arc<Self>) {
        loop {
            tracing::info!("scheduled job parsing started");
            let this = Arc::clone(&self);
            match tokio::spawn(async move { this.run_once().await }).await {
                Ok(_) => tracing::info!(
                    next_in_secs = self.settings.interval.as_secs(),
                    "next scheduled parsing planned"
                ),
                Err(e) => tracing::error!(error = %e, "scheduled parsing failed"),
            }
            tokio::time::sleep(self.settings.interval).await;
        }
    }

    pub fn spawn_scheduler(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(self.run_forever())
    }
}
