//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use dfguard_media::ModelReadiness;
use serde::Serialize;

use crate::state::AppState;

/// Root message.
#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// Landing endpoint naming the prediction routes.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to Deepfake Guard API. Use /predict/video, /predict/image, or /predict/audio endpoints.",
    })
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub image_classifier: CheckStatus,
    pub audio_classifier: CheckStatus,
    pub face_locator: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckStatus {
    fn from_loaded(loaded: bool) -> Self {
        if loaded {
            Self {
                status: "ok".to_string(),
                error: None,
            }
        } else {
            Self {
                status: "error".to_string(),
                error: Some("not loaded".to_string()),
            }
        }
    }
}

impl From<ModelReadiness> for ReadinessChecks {
    fn from(readiness: ModelReadiness) -> Self {
        Self {
            image_classifier: CheckStatus::from_loaded(readiness.image_classifier),
            audio_classifier: CheckStatus::from_loaded(readiness.audio_classifier),
            face_locator: CheckStatus::from_loaded(readiness.face_locator),
        }
    }
}

/// Readiness check endpoint (readiness probe).
/// Reports which models are loaded; 503 unless all of them are.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let readiness = state.detector.readiness();
    let all_ok = readiness.all_loaded();

    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: readiness.into(),
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
