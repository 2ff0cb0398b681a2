//! Axum JSON API around the entity-extraction pipeline: train a model,
//! query it, and fetch the demo dataset.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use nlu_core::{
    corpus, EntityMap, ExtractError, ExtractorPipeline, HeuristicAnnotator, ModelStore,
    SynonymTable, TrainingExample, TrainingReport,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state: one pipeline, one model cache.
struct AppState {
    pipeline: ExtractorPipeline,
}

#[derive(Deserialize)]
struct PredictRequest {
    text: String,
}

#[derive(Serialize)]
struct PredictResponse {
    model_id: String,
    entities: EntityMap,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let models_dir =
        std::env::var("NLU_MODELS_DIR").unwrap_or_else(|_| "model_files".to_string());
    let addr = std::env::var("NLU_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let synonyms = match std::env::var("NLU_SYNONYMS") {
        Ok(path) => match SynonymTable::from_json_file(&path) {
            Ok(table) => {
                info!(%path, entries = table.len(), "loaded synonym table");
                table
            }
            Err(err) => {
                error!(%path, %err, "failed to load synonym table");
                std::process::exit(1);
            }
        },
        Err(_) => corpus::demo_synonyms(),
    };

    let pipeline = ExtractorPipeline::new(
        Box::new(HeuristicAnnotator),
        ModelStore::new(&models_dir),
    )
    .with_synonyms(synonyms);
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/demo-data", get(demo_data_handler))
        .route("/models/:id/train", post(train_handler))
        .route("/models/:id/predict", post(predict_handler))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!(%addr, %models_dir, "entity extraction API listening");
    axum::serve(listener, app).await.unwrap();
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// The built-in annotated dataset, handy for trying out `/train`.
async fn demo_data_handler() -> impl IntoResponse {
    Json(corpus::demo_training_data())
}

/// Train (or retrain) the model stored under `id` from a JSON batch of
/// annotated examples. Training is CPU-bound, so it runs off the runtime.
async fn train_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(examples): Json<Vec<TrainingExample>>,
) -> Result<Json<TrainingReport>, ApiError> {
    let report = tokio::task::spawn_blocking(move || state.pipeline.train(&examples, &id))
        .await
        .map_err(|_| ApiError::internal("training task panicked"))??;
    Ok(Json(report))
}

async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError {
            status: StatusCode::BAD_REQUEST,
            message: "text is empty".to_string(),
        });
    }
    let entities = state.pipeline.predict(&req.text, &id)?;
    Ok(Json(PredictResponse {
        model_id: id,
        entities,
    }))
}

/// HTTP mapping of pipeline failures: structured JSON, never a bare crash.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        let status = match &err {
            ExtractError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            ExtractError::InvalidModelId(_) => StatusCode::BAD_REQUEST,
            ExtractError::TrainingData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ExtractError::LabelAlignment { .. }
            | ExtractError::Io { .. }
            | ExtractError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(%err, "pipeline failure");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
