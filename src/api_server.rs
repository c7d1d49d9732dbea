// Axum API Server Module
//
// Purpose: HTTP front end for batch CI scoring
// Endpoints: GET / (greeting), GET /health, POST /calculate

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::calculator::{CalculationOutput, CiCalculator};
use crate::config::AppConfig;
use crate::feature::BatchRequest;
use crate::reference::ReferenceDataStore;

pub const GREETING: &str = "Hello, This is the GREET Calculator API!";

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub calculator: Arc<CiCalculator>,
    pub api_key: Option<Arc<str>>,
    pub parallel_scoring: bool,
}

impl AppState {
    /// Load reference data from `config.data_dir`
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let store = ReferenceDataStore::load(&config.data_dir)?;
        Ok(Self::with_calculator(
            CiCalculator::new(Arc::new(store)),
            config.api_key.clone(),
            config.parallel_scoring,
        ))
    }

    pub fn with_calculator(calculator: CiCalculator, api_key: Option<String>, parallel_scoring: bool) -> Self {
        Self {
            calculator: Arc::new(calculator),
            api_key: api_key.map(Arc::from),
            parallel_scoring,
        }
    }

    fn authorize(&self, provided: Option<&str>) -> Result<(), AppError> {
        let provided = provided.ok_or_else(|| AppError::Forbidden("No API key provided".to_string()))?;
        let expected = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Internal("API key not configured on server".to_string()))?;
        if provided != expected {
            return Err(AppError::Forbidden("Invalid API key".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(greet))
        .route("/health", get(health_check))
        .route("/calculate", post(calculate))
        // Middleware (applied in reverse order)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

async fn greet(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.authorize(query.key.as_deref())?;
    Ok(Json(serde_json::json!({ "message": GREETING })))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn calculate(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<CalculationOutput>, AppError> {
    state.authorize(query.key.as_deref())?;

    let request: BatchRequest =
        serde_json::from_value(payload).map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;

    let feature_count = request.geojson.features.len();
    tracing::info!("Calculating CI scores for {} features", feature_count);

    // CPU-bound work: run in blocking thread pool
    let calculator = state.calculator.clone();
    let parallel = state.parallel_scoring;
    let output = tokio::task::spawn_blocking(move || {
        if parallel {
            calculator.calculate_parallel(&request)
        } else {
            calculator.calculate(&request)
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
    .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(output))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Forbidden(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::error!("{}", message);
        }

        let body = Json(serde_json::json!({
            "detail": message
        }));

        (status, body).into_response()
    }
}
