// src/api.rs
//! Thin HTTP control surface. Read/query endpoints and job control are
//! pass-throughs over the orchestrator and the store; no pipeline logic
//! lives here.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;

use crate::model::{ContentType, JobRunStatus};
use crate::scheduler::Orchestrator;
use crate::store::EntityStore;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn EntityStore>,
    pub prometheus: Option<PrometheusHandle>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/jobs", get(list_jobs))
        .route("/jobs/{id}", get(job_status))
        .route("/jobs/collect", post(trigger_collect))
        .route("/stats", get(stats))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobRunStatus>> {
    Json(state.orchestrator.list_jobs())
}

async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobRunStatus>, StatusCode> {
    state
        .orchestrator
        .job_status(&id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Kicks off a collect-all run in the background and returns immediately.
/// Re-enters the exact code path the scheduled run uses.
async fn trigger_collect(State(state): State<AppState>) -> StatusCode {
    let orch = state.orchestrator.clone();
    tokio::spawn(async move { orch.trigger_now().await });
    StatusCode::ACCEPTED
}

async fn stats(State(state): State<AppState>) -> Json<BTreeMap<String, usize>> {
    let mut counts = BTreeMap::new();
    for kind in ContentType::ALL {
        let n = state.store.count(kind).await.unwrap_or(0);
        counts.insert(kind.as_str().to_string(), n);
    }
    Json(counts)
}

async fn metrics(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .prometheus
        .as_ref()
        .map(|h| h.render())
        .ok_or(StatusCode::NOT_FOUND)
}
