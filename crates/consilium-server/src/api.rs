//! Routes, handlers, and the error-to-status mapping.

use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use consilium_core::types::{ConsultationRecord, ConsultationRequest, SessionHistory};
use consilium_core::ConsultError;
use consilium_providers::ProviderError;
use log::error;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

/// Service name reported by the banner and health endpoints.
const SERVICE_NAME: &str = "Consilium Health Advisor";

/// Build the API router over shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/", get(service_banner))
        .route("/api/health", get(health_check))
        .route("/api/consult", post(submit_consultation))
        .route("/api/consultations/{session_id}", get(consultation_history))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /api/consult
async fn submit_consultation(
    State(state): State<AppState>,
    Json(request): Json<ConsultationRequest>,
) -> Result<Json<ConsultationRecord>, ApiError> {
    let record = state.orchestrator.handle(request).await?;
    Ok(Json(record))
}

/// GET /api/consultations/{session_id}
async fn consultation_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionHistory>, ApiError> {
    let history = state.orchestrator.fetch_history(&session_id).await?;
    Ok(Json(history))
}

/// GET /api/health reports degraded fields rather than failing.
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let health = state.orchestrator.health().await;
    let mut body = serde_json::Map::new();
    let status = if health.store_reachable {
        "healthy"
    } else {
        "degraded"
    };
    body.insert("status".to_string(), json!(status));
    body.insert(
        "database".to_string(),
        json!(if health.store_reachable {
            "connected"
        } else {
            "disconnected"
        }),
    );
    for provider in &health.providers {
        body.insert(
            provider.kind.as_str().to_string(),
            json!(if provider.configured {
                "configured"
            } else {
                "not configured"
            }),
        );
    }
    body.insert("service".to_string(), json!(SERVICE_NAME));
    Json(Value::Object(body))
}

/// GET /api/ service banner.
async fn service_banner() -> Json<Value> {
    Json(json!({
        "message": "Consilium - general health education and guidance",
        "version": env!("CARGO_PKG_VERSION"),
        "disclaimer": "This service provides general health information only, not medical advice.",
        "service": SERVICE_NAME,
    }))
}

/// Stable status category plus a caller-safe message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Status assigned to this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ConsultError> for ApiError {
    /// Map a core failure to a status and a message safe to return.
    ///
    /// Upstream and store detail is logged here and never echoed to callers.
    fn from(err: ConsultError) -> Self {
        match err {
            ConsultError::Validation(message) => Self {
                status: StatusCode::BAD_REQUEST,
                message,
            },
            ConsultError::TooManyRequests => Self {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "Too many requests. Please wait a minute before trying again."
                    .to_string(),
            },
            ConsultError::Provider(ProviderError::RateLimited) => Self {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "Rate limit exceeded. Please try again in a few minutes.".to_string(),
            },
            ConsultError::Provider(ProviderError::Unconfigured) => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "The selected AI provider is not configured.".to_string(),
            },
            ConsultError::Provider(ProviderError::Timeout) => Self {
                status: StatusCode::GATEWAY_TIMEOUT,
                message: "The AI provider did not respond in time.".to_string(),
            },
            ConsultError::Provider(ProviderError::Upstream(detail)) => {
                error!("upstream provider failure: {detail}");
                Self {
                    status: StatusCode::BAD_GATEWAY,
                    message: "AI service error".to_string(),
                }
            }
            ConsultError::Store(err) => {
                error!("consultation store failure: {err}");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Failed to record consultation".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
