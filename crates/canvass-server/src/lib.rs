#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use canvass_store::ResponseStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

mod assemble;
mod config;
mod etag;
mod gate;
mod http;
mod middleware;
mod postcheck;

pub use canvass_store::{FakeStore, SqliteStore};
pub use config::{validate_startup_config_contract, ServiceConfig, CONFIG_SCHEMA_VERSION};

pub const CRATE_NAME: &str = "canvass-server";

#[derive(Default)]
pub(crate) struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, Vec<u64>>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_insert_with(Vec::new)
            .push(latency.as_nanos() as u64);
    }

    pub(crate) async fn render_text(&self) -> String {
        let counts = self.counts.lock().await;
        let mut lines: Vec<String> = counts
            .iter()
            .map(|((route, status), count)| {
                format!("canvass_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}")
            })
            .collect();
        drop(counts);
        let latency_map = self.latency_ns.lock().await;
        for (route, samples) in latency_map.iter() {
            if samples.is_empty() {
                continue;
            }
            let mut sorted = samples.clone();
            sorted.sort_unstable();
            let idx = ((sorted.len() as f64) * 0.95).ceil() as usize;
            let p95_ns = sorted[idx.saturating_sub(1).min(sorted.len() - 1)];
            lines.push(format!(
                "canvass_request_latency_p95_ms{{route=\"{route}\"}} {}",
                p95_ns / 1_000_000
            ));
        }
        lines.sort();
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResponseStore>,
    pub api: ServiceConfig,
    pub ready: Arc<AtomicBool>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn ResponseStore>) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    #[must_use]
    pub fn with_config(store: Arc<dyn ResponseStore>, api: ServiceConfig) -> Self {
        Self {
            store,
            api,
            ready: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::ops::healthz_handler))
        .route("/readyz", get(http::ops::readyz_handler))
        .route("/metrics", get(http::ops::metrics_handler))
        .route(
            "/api/v1/response-sets/{response_set_id}/screens/{screen_key}",
            get(http::screens::get_screen_handler),
        )
        .route(
            "/api/v1/response-sets/{response_set_id}/answers/{question_id}",
            patch(http::answers::autosave_answer_handler)
                .delete(http::answers::delete_answer_handler),
        )
        .route(
            "/api/v1/response-sets/{response_set_id}/answers:batch",
            post(http::answers::batch_upsert_handler),
        )
        .route(
            "/api/v1/response-sets/{response_set_id}",
            delete(http::response_sets::delete_response_set_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
