//! HTTP front end for the evaluator.
//!
//! Routes:
//! - `GET /health`
//! - `POST /v1/evaluate` with `{"text": "..."}`
//! - `POST /v1/normalize` with `{"raw": "..."}` (validates a model reply you
//!   already have, no model call)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::{error::LLMError, evaluation::Evaluation, evaluator::Evaluator};

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub raw: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub request_id: String,
}

type ApiResult = Result<Json<Evaluation>, (StatusCode, Json<ErrorResponse>)>;

/// Builds the router. Exposed separately from [`serve`] so it can be
/// mounted inside a larger application.
pub fn router(evaluator: Arc<Evaluator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/evaluate", post(evaluate))
        .route("/v1/normalize", post(normalize_raw))
        .layer(CorsLayer::permissive())
        .with_state(evaluator)
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve(addr: SocketAddr, evaluator: Arc<Evaluator>) -> Result<(), LLMError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LLMError::Generic(format!("Failed to bind {addr}: {e}")))?;
    log::info!("listening on http://{addr}");
    axum::serve(listener, router(evaluator))
        .await
        .map_err(|e| LLMError::Generic(format!("Server error: {e}")))
}

async fn health() -> &'static str {
    "ok"
}

async fn evaluate(
    State(evaluator): State<Arc<Evaluator>>,
    Json(req): Json<EvaluateRequest>,
) -> ApiResult {
    let request_id = Uuid::new_v4().to_string();
    log::info!("[{request_id}] evaluate ({} bytes)", req.text.len());

    match evaluator.evaluate(&req.text).await {
        Ok(evaluation) => Ok(Json(evaluation)),
        Err(e) => Err(error_response(request_id, &e)),
    }
}

async fn normalize_raw(Json(req): Json<NormalizeRequest>) -> ApiResult {
    let request_id = Uuid::new_v4().to_string();
    log::info!("[{request_id}] normalize ({} bytes)", req.raw.len());

    req.raw
        .parse::<Evaluation>()
        .map(Json)
        .map_err(|e| error_response(request_id, &LLMError::from(e)))
}

fn status_for(err: &LLMError) -> StatusCode {
    match err {
        LLMError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        LLMError::InvalidEvaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LLMError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(request_id: String, err: &LLMError) -> (StatusCode, Json<ErrorResponse>) {
    let status = status_for(err);
    log::warn!("[{request_id}] {status}: {err}");
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            request_id,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NormalizationError;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            status_for(&LLMError::InvalidRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&LLMError::InvalidEvaluation(
                NormalizationError::RangeViolation {
                    path: "facts[0].confidence".into(),
                    value: 2.0
                }
            )),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&LLMError::HttpError("timeout".into())),
            StatusCode::BAD_GATEWAY
        );
    }
}
