// src/jobs/mod.rs
pub mod fetch;
pub mod filter;
pub mod sites;
pub mod types;

use chrono::Local;
use metrics::{counter, histogram};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::jobs::fetch::PageFetcher;
use crate::jobs::filter::KeywordFilter;
use crate::jobs::sites::SiteExtractor;
use crate::jobs::types::{JobId, JobRecord, Stage, StageFailure, StageOutcome};

/// Runs the configured extractors and keeps the in-process cache of
/// identifiers already emitted since startup.
pub struct JobParser {
    extractors: Vec<Box<dyn SiteExtractor>>,
    fetcher: Arc<dyn PageFetcher>,
    filter: KeywordFilter,
    site_delay: Duration,
    seen: Mutex<HashSet<JobId>>,
}

impl JobParser {
    pub fn new(
        extractors: Vec<Box<dyn SiteExtractor>>,
        fetcher: Arc<dyn PageFetcher>,
        filter: KeywordFilter,
        site_delay: Duration,
    ) -> Self {
        Self {
            extractors,
            fetcher,
            filter,
            site_delay,
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn site_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.source()).collect()
    }

    pub fn cached_len(&self) -> usize {
        self.seen().len()
    }

    /// Drop `id` from the process cache so the next cycle can emit it again.
    /// Used when a delivery fails.
    pub fn forget(&self, id: &JobId) -> bool {
        self.seen().remove(id)
    }

    // a panic elsewhere must not lose the cache
    fn seen(&self) -> MutexGuard<'_, HashSet<JobId>> {
        match self.seen.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Fetch one site for `query` and return the new, filter-passing records.
    /// A request failure aborts this site only; a broken listing is skipped.
    pub async fn extract_site(
        &self,
        extractor: &dyn SiteExtractor,
        query: &str,
    ) -> StageOutcome<Vec<JobRecord>> {
        let site = extractor.source();
        let context = format!("{site}/{query}");

        let url = match extractor.endpoint().request_url(query) {
            Ok(u) => u,
            Err(e) => {
                counter!("site_request_errors_total").increment(1);
                return StageOutcome::Failure(StageFailure::new(Stage::Request, context, &e));
            }
        };
        let html = match self.fetcher.fetch(&url).await {
            Ok(body) => body,
            Err(e) => {
                counter!("site_request_errors_total").increment(1);
                return StageOutcome::Failure(StageFailure::new(Stage::Request, context, &e));
            }
        };

        let t0 = std::time::Instant::now();
        let parsed = extractor.parse_listings(&html, query, Local::now());
        histogram!("site_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let mut jobs = Vec::new();
        let mut seen = self.seen();
        for item in parsed {
            let job = match item {
                Ok(job) => job,
                Err(e) => {
                    counter!("listing_parse_errors_total").increment(1);
                    StageFailure::new(Stage::RecordParse, context.as_str(), &e).log();
                    continue;
                }
            };
            counter!("jobs_scraped_total").increment(1);

            let id = job.id();
            if seen.contains(&id) {
                counter!("jobs_cache_dup_total").increment(1);
                continue;
            }
            if !self.filter.passes(&job) {
                counter!("jobs_filtered_total").increment(1);
                continue;
            }
            seen.insert(id);
            jobs.push(job);
        }
        drop(seen);

        tracing::info!(site, query, found = jobs.len(), "new jobs extracted");
        StageOutcome::Success(jobs)
    }

    /// All sites in configured order, `site_delay` between invocations.
    pub async fn parse_all_sites(&self, query: &str) -> Vec<JobRecord> {
        crate::metrics::ensure_metrics_described();
        let mut all = Vec::new();
        for (i, extractor) in self.extractors.iter().enumerate() {
            if i > 0 && !self.site_delay.is_zero() {
                tokio::time::sleep(self.site_delay).await;
            }
            let mut jobs = self
                .extract_site(extractor.as_ref(), query)
                .await
                .unwrap_or_log(Vec::new());
            all.append(&mut jobs);
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::fetch::SiteEndpoint;
    use crate::jobs::sites::habr_career::HabrCareerExtractor;
    use crate::jobs::sites::hh_ru::HhRuExtractor;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use url::Url;

    struct StaticFetcher(String);

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &Url) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct DownFetcher;

    #[async_trait]
    impl PageFetcher for DownFetcher {
        async fn fetch(&self, url: &Url) -> Result<String> {
            anyhow::bail!("HTTP 503 Service Unavailable for {url}")
        }
    }

    /// First request fails; every request records when it happened.
    struct TimedFetcher {
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    #[async_trait]
    impl PageFetcher for TimedFetcher {
        async fn fetch(&self, url: &Url) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(tokio::time::Instant::now());
            if calls.len() == 1 {
                anyhow::bail!("connection reset by {url}");
            }
            Ok(String::new())
        }
    }

    fn hh() -> Box<dyn SiteExtractor> {
        let mut params = BTreeMap::new();
        params.insert("text".into(), "{query}".into());
        Box::new(HhRuExtractor::new(SiteEndpoint::new("https://hh.ru/search/vacancy", params)).unwrap())
    }

    const PAGE: &str = r#"
<div class="vacancy-serp-item">
  <a data-qa="vacancy-serp__vacancy-title" href="https://hh.ru/vacancy/1">Senior Python Developer</a>
</div>
<div class="vacancy-serp-item">
  <a data-qa="vacancy-serp__vacancy-title" href="https://hh.ru/vacancy/2">Python Developer</a>
  <div data-qa="vacancy-serp__vacancy_snippet_responsibility">junior friendly, 1+ years</div>
</div>
<div class="vacancy-serp-item">
  <a data-qa="vacancy-serp__vacancy-title">no href</a>
</div>"#;

    fn parser(fetcher: Arc<dyn PageFetcher>) -> JobParser {
        JobParser::new(
            vec![hh()],
            fetcher,
            KeywordFilter::new(&["senior".into(), "junior".into()], &["1+ years".into()], 0),
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn filters_and_skips_broken_listings() {
        let p = parser(Arc::new(StaticFetcher(PAGE.into())));
        let jobs = p.parse_all_sites("Python").await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Senior Python Developer");
        assert_eq!(p.cached_len(), 1);
    }

    #[tokio::test]
    async fn process_cache_suppresses_repeats_across_queries() {
        let p = parser(Arc::new(StaticFetcher(PAGE.into())));
        assert_eq!(p.parse_all_sites("Python").await.len(), 1);
        assert!(p.parse_all_sites("Backend Developer").await.is_empty());
    }

    #[tokio::test]
    async fn request_failure_is_reported_not_raised() {
        let p = parser(Arc::new(DownFetcher));
        let ex = hh();
        match p.extract_site(ex.as_ref(), "Python").await {
            StageOutcome::Failure(f) => {
                assert_eq!(f.stage, Stage::Request);
                assert_eq!(f.context, "hh.ru/Python");
                assert!(f.reason.contains("503"));
            }
            StageOutcome::Success(_) => panic!("expected request failure"),
        }
        assert!(p.parse_all_sites("Python").await.is_empty());
    }

    #[tokio::test]
    async fn forget_makes_a_job_eligible_again() {
        let p = parser(Arc::new(StaticFetcher(PAGE.into())));
        let jobs = p.parse_all_sites("Python").await;
        assert_eq!(jobs.len(), 1);

        assert!(p.forget(&jobs[0].id()));
        assert!(!p.forget(&jobs[0].id()));
        assert_eq!(p.cached_len(), 0);
        assert_eq!(p.parse_all_sites("Python").await.len(), 1);
    }

    #[tokio::test]
    async fn poisoned_cache_keeps_its_contents() {
        let p = parser(Arc::new(StaticFetcher(PAGE.into())));
        assert_eq!(p.parse_all_sites("Python").await.len(), 1);

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = p.seen.lock().unwrap();
            panic!("poison the cache lock");
        }));
        assert!(p.seen.is_poisoned());
        assert_eq!(p.cached_len(), 1);
        assert!(p.parse_all_sites("Python").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn site_delay_applies_after_failed_site() {
        let fetcher = Arc::new(TimedFetcher {
            calls: Mutex::new(Vec::new()),
        });
        let habr = HabrCareerExtractor::new(SiteEndpoint::new(
            "https://career.habr.com/vacancies",
            BTreeMap::new(),
        ))
        .unwrap();
        let p = JobParser::new(
            vec![hh(), Box::new(habr)],
            fetcher.clone(),
            KeywordFilter::default(),
            Duration::from_secs(2),
        );

        let start = tokio::time::Instant::now();
        assert!(p.parse_all_sites("Python").await.is_empty());

        let calls = fetcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[1] - calls[0] >= Duration::from_secs(2));
        // no trailing delay after the last site
        assert!(start.elapsed() < Duration::from_secs(3));
    }
}
