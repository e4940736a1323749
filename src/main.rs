// HTTP front end for the bubble processing pipeline

use bubble_pipeline::{core::Config, orchestration::BubblePipeline, PipelineError};

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{error, info};

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    pipeline: Arc<BubblePipeline>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(Config::new()?);

    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new(format!(
        "bubble_pipeline={}",
        match config.log_level() {
            tracing::Level::TRACE => "trace",
            tracing::Level::DEBUG => "debug",
            tracing::Level::INFO => "info",
            tracing::Level::WARN => "warn",
            tracing::Level::ERROR => "error",
        }
    ));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("=== BUBBLE PIPELINE ===");
    info!(
        "Config: detector={} recognizer={} concurrency={} overlays={}",
        config.detector_endpoint(),
        config.recognizer_endpoint(),
        config.max_concurrent_extractions(),
        config.overlay_dir()
    );

    let pipeline = Arc::new(BubblePipeline::new(config.clone())?);
    let state = AppState { pipeline };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/process", post(process_image))
        .nest_service("/overlays", ServeDir::new(config.overlay_dir()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024)) // 50MB pages
        .layer(cors);

    let addr = format!("{}:{}", config.server_host(), config.server_port());
    info!("Server starting on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /          - Root endpoint");
    info!("  GET  /health    - Health check");
    info!("  POST /process   - Process an image (multipart/form-data)");
    info!("  GET  /overlays/ - Serve synthesized overlays");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> &'static str {
    "Bubble Processing Pipeline"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Process one uploaded image: detect bubbles, extract text regions, and
/// synthesize overlays. Returns the assembled per-bubble results.
async fn process_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "no file part" })),
            );
        }
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": err.to_string() })),
            );
        }
    };

    let image_bytes = match field.bytes().await {
        Ok(bytes) if !bytes.is_empty() => bytes.to_vec(),
        Ok(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "empty file" })),
            );
        }
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": err.to_string() })),
            );
        }
    };

    match state.pipeline.run(image_bytes).await {
        Ok(results) => (StatusCode::OK, Json(serde_json::json!({ "bubbles": results }))),
        Err(err @ PipelineError::ImageLoad(_)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "error": err.to_string() })),
        ),
        Err(err) => {
            error!(error = %err, "Pipeline run failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": err.to_string() })),
            )
        }
    }
}
