// tests/api_http.rs
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    Router,
};
use http::{Request, StatusCode};
use job_feed_bot::api::{create_router, AppState};
use job_feed_bot::config::AppConfig;
use job_feed_bot::jobs::fetch::PageFetcher;
use job_feed_bot::notify::LogNotifier;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`
use url::Url;

struct OneListing;

#[async_trait]
impl PageFetcher for OneListing {
    async fn fetch(&self, url: &Url) -> Result<String> {
        Ok(format!(
            r#"<div class="vacancy-serp-item"><a data-qa="vacancy-serp__vacancy-title" href="https://{}/vacancy/1">Senior Go</a></div>
<div class="vacancy-card"><a class="vacancy-card__title-link" href="/vacancies/1">Senior Go</a></div>"#,
            url.host_str().unwrap_or_default()
        ))
    }
}

fn app(dir: &std::path::Path) -> Router {
    let mut cfg = AppConfig::default();
    cfg.search_queries = vec!["Go".into()];
    cfg.site_delay_ms = 0;
    cfg.send_delay_ms = 0;
    cfg.state_path = dir.join("sent_jobs.json");
    let delivery =
        job_feed_bot::build_delivery_loop(&cfg, Arc::new(OneListing), Arc::new(LogNotifier)).unwrap();
    create_router(AppState {
        delivery: Arc::new(delivery),
        target_chat: "-100123".into(),
    })
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let resp = app(dir.path())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn parse_then_status_reports_tracked_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let resp = app
        .clone()
        .oneshot(Request::post("/parse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["delivered"], 2);

    let resp = app
        .clone()
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["tracked_jobs"], 2);
    assert_eq!(v["interval_minutes"], 60);
    assert_eq!(v["target_chat"], "-100123");
    assert_eq!(v["queries"], serde_json::json!(["Go"]));
    assert_eq!(v["sites"], serde_json::json!(["hh.ru", "habr.com"]));
    assert_eq!(v["cycle_running"], false);

    // nothing new upstream
    let resp = app
        .oneshot(Request::post("/parse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["delivered"], 0);
}
