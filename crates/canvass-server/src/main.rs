#![forbid(unsafe_code)]

use canvass_core::{
    ENV_CANVASS_BIND, ENV_CANVASS_DB_PATH, ENV_CANVASS_LOG_JSON, ENV_CANVASS_SEED_PATH,
};
use canvass_engine::QuestionGraph;
use canvass_model::{Question, ResponseSet};
use canvass_server::{
    build_router, validate_startup_config_contract, AppState, ServiceConfig, SqliteStore,
};
use canvass_store::ResponseStore;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool(ENV_CANVASS_LOG_JSON, true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    questions: Vec<Question>,
    #[serde(default)]
    response_sets: Vec<ResponseSet>,
}

async fn seed_from_file(store: &dyn ResponseStore, path: &Path) -> Result<(), String> {
    let raw = std::fs::read(path).map_err(|e| format!("read seed file: {e}"))?;
    let seed: SeedFile =
        serde_json::from_slice(&raw).map_err(|e| format!("parse seed file: {e}"))?;
    for question in &seed.questions {
        store
            .insert_question(question)
            .await
            .map_err(|e| format!("seed question: {e}"))?;
    }
    for set in &seed.response_sets {
        store
            .create_response_set(set)
            .await
            .map_err(|e| format!("seed response set: {e}"))?;
    }
    info!(
        questions = seed.questions.len(),
        response_sets = seed.response_sets.len(),
        "seed loaded"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var(ENV_CANVASS_BIND).unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let api = ServiceConfig {
        max_body_bytes: env_usize("CANVASS_MAX_BODY_BYTES", 64 * 1024),
        max_batch_items: env_usize("CANVASS_MAX_BATCH_ITEMS", 100),
        max_idempotency_key_bytes: env_usize("CANVASS_MAX_IDEMPOTENCY_KEY_BYTES", 256),
        request_timeout: env_duration_ms("CANVASS_REQUEST_TIMEOUT_MS", 5000),
        enable_metrics_endpoint: env_bool("CANVASS_ENABLE_METRICS", true),
    };
    validate_startup_config_contract(&api)?;

    let db_path =
        env::var(ENV_CANVASS_DB_PATH).unwrap_or_else(|_| "data/canvass.sqlite".to_string());
    if let Some(parent) = Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| format!("create db dir: {e}"))?;
        }
    }
    let store = Arc::new(
        SqliteStore::open(Path::new(&db_path)).map_err(|e| format!("open store: {e}"))?,
    );

    let state = AppState::with_config(store.clone(), api);
    state.ready.store(false, Ordering::Relaxed);

    if let Ok(seed_path) = env::var(ENV_CANVASS_SEED_PATH) {
        seed_from_file(store.as_ref(), Path::new(&seed_path)).await?;
    }

    // Refuse to serve definitions the engine would reject per request.
    let questions = store
        .list_questions()
        .await
        .map_err(|e| format!("load questions: {e}"))?;
    QuestionGraph::build(questions).map_err(|e| format!("question definitions invalid: {e}"))?;
    state.ready.store(true, Ordering::Relaxed);

    let app = build_router(state);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr}: {e}"))?;
    info!("canvass-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
