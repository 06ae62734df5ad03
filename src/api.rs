use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::delivery::DeliveryLoop;

#[derive(Clone)]
pub struct AppState {
    pub delivery: Arc<DeliveryLoop>,
    /// Shown on /status only.
    pub target_chat: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status))
        .route("/parse", post(parse_now))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct StatusResp {
    queries: Vec<String>,
    interval_minutes: u64,
    target_chat: String,
    sites: Vec<&'static str>,
    tracked_jobs: usize,
    cached_jobs: usize,
    cycle_running: bool,
}

async fn status(State(state): State<AppState>) -> Json<StatusResp> {
    let d = &state.delivery;
    // counted from the file, like the next cycle will see it
    let tracked = d.store().load().await.len();
    Json(StatusResp {
        queries: d.settings().queries.clone(),
        interval_minutes: d.settings().interval.as_secs() / 60,
        target_chat: state.target_chat.clone(),
        sites: d.parser().site_names(),
        tracked_jobs: tracked,
        cached_jobs: d.parser().cached_len(),
        cycle_running: d.is_running(),
    })
}

#[derive(serde::Serialize)]
struct ParseResp {
    delivered: usize,
}

async fn parse_now(
    State(state): State<AppState>,
) -> Result<Json<ParseResp>, (StatusCode, &'static str)> {
    tracing::info!(target: "api", "manual parse requested");
    match state.delivery.try_run_once().await {
        Some(jobs) => Ok(Json(ParseResp {
            delivered: jobs.len(),
        })),
        None => Err((StatusCode::CONFLICT, "a parsing cycle is already running")),
    }
}
