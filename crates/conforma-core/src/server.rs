use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use conforma_broker::{parse_url_list, BatchError, ValidationHandle};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(handle: ValidationHandle) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/validate", post(validate))
        .route("/api/results", get(results))
        .route("/api/clear-results", delete(clear_results))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(handle)
}

/// HTTP rendering of [`BatchError`].
#[derive(Debug)]
pub struct ApiError(pub BatchError);

impl From<BatchError> for ApiError {
    fn from(error: BatchError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BatchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BatchError::Browser(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BatchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BatchError::NotPersisted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            BatchError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        };

        let mut body = json!({
            "error": self.0.to_string(),
        });
        if let BatchError::NotPersisted { reports, .. } = &self.0 {
            body["reports"] = json!(reports);
        }

        (status, Json(body)).into_response()
    }
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /api/validate with body `{"urls": [...]}`.
async fn validate(
    State(handle): State<ValidationHandle>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|rejection| BatchError::InvalidInput(rejection.body_text()))?;
    let urls = body
        .get("urls")
        .ok_or_else(|| BatchError::InvalidInput("missing `urls` field".to_string()))?;
    let targets = parse_url_list(urls)?;

    let urls = targets.iter().map(|target| target.as_str().to_string()).collect();
    let reports = handle.validate(urls).await?;
    Ok(Json(json!({ "reports": reports })))
}

/// GET /api/results: the last stored batch.
async fn results(State(handle): State<ValidationHandle>) -> Result<Json<Value>, ApiError> {
    let reports = handle.list_reports().await?;
    Ok(Json(json!({ "reports": reports })))
}

/// DELETE /api/clear-results
async fn clear_results(State(handle): State<ValidationHandle>) -> Result<Json<Value>, ApiError> {
    handle.clear_reports().await?;
    Ok(Json(json!({ "message": "stored results cleared" })))
}
