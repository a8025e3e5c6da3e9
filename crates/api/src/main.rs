mod config;
mod error;
mod metrics;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::ServerConfig;
use error::ApiError;
use extract::{ModelCascade, Review, Reviewer};
use metrics::{Metrics, MetricsSnapshot, TimedOperation};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Outcome of the startup model cascade. Decided once, never changed.
enum ModelSlot {
    Loaded(Reviewer),
    Failed(String),
}

struct AppState {
    config: ServerConfig,
    model: ModelSlot,
    metrics: Arc<Metrics>,
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    model_loaded: bool,
    load_error: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env()?;

    let cascade = ModelCascade::ollama(&config.ollama_url, &config.models);
    let model = match cascade.initialize().await {
        Ok(completion) => ModelSlot::Loaded(Reviewer::new(completion, config.max_output_chars)),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "No model available, serving health only");
            ModelSlot::Failed(format!("{:#}", e))
        }
    };

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState {
        config,
        model,
        metrics: Metrics::new(),
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/review", post(review_document))
        .route("/stats", get(get_stats))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (model_loaded, load_error) = match &state.model {
        ModelSlot::Loaded(_) => (true, None),
        ModelSlot::Failed(e) => (false, Some(e.clone())),
    };

    Json(HealthResponse {
        ok: true,
        model_loaded,
        load_error,
    })
}

async fn review_document(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Review>, ApiError> {
    let timer = TimedOperation::start();
    let result = run_review(&state, multipart).await;

    state.metrics.record_request(result.is_ok());
    if let Ok(review) = &result {
        state.metrics.record_review(timer.elapsed(), review.record.flags.len());
    }

    result.map(Json)
}

async fn run_review(state: &AppState, mut multipart: Multipart) -> Result<Review, ApiError> {
    let reviewer = match &state.model {
        ModelSlot::Loaded(reviewer) => reviewer,
        ModelSlot::Failed(e) => return Err(ApiError::ModelNotLoaded(e.clone())),
    };

    let mut file_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {}", e)))?;
            file_bytes = Some(bytes);
            break;
        }
    }

    let bytes = file_bytes.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    let text = ingest::prepare_text(&bytes, state.config.max_input_chars);

    reviewer
        .review(&text)
        .await
        .map_err(|e| ApiError::Internal(format!("{:#}", e)))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
