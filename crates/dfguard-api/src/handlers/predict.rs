//! Upload-and-classify handlers.
//!
//! The multipart `file` field is streamed into a request-scoped temporary
//! file that keeps the upload's extension. The detector only ever sees the
//! path; the file is removed when the guard drops, whatever the outcome.

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::Json;
use dfguard_models::{extension_of, Modality, PredictionResponse};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::sanitize_filename;
use crate::state::AppState;

/// Multipart field carrying the media file.
pub const UPLOAD_FIELD: &str = "file";

/// POST /predict/video
pub async fn predict_video(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<PredictionResponse>> {
    predict_upload(&state, &user, Modality::Video, multipart).await
}

/// POST /predict/image
pub async fn predict_image(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<PredictionResponse>> {
    predict_upload(&state, &user, Modality::Image, multipart).await
}

/// POST /predict/audio
pub async fn predict_audio(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<PredictionResponse>> {
    predict_upload(&state, &user, Modality::Audio, multipart).await
}

async fn predict_upload(
    state: &AppState,
    user: &AuthUser,
    modality: Modality,
    mut multipart: Multipart,
) -> ApiResult<Json<PredictionResponse>> {
    let upload = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?
            .ok_or_else(|| {
                ApiError::Validation(format!("Missing multipart field '{}'", UPLOAD_FIELD))
            })?;

        if field.name() == Some(UPLOAD_FIELD) {
            break persist_upload(user, modality, field).await?;
        }
        debug!(field = ?field.name(), "Ignoring multipart field");
    };

    let result = state.detector.predict(modality, upload.path()).await?;

    Ok(Json(PredictionResponse::from(result)))
}

/// Validate the extension and stream the field to a temporary file.
async fn persist_upload(
    user: &AuthUser,
    modality: Modality,
    mut field: Field<'_>,
) -> ApiResult<NamedTempFile> {
    let original = field.file_name().unwrap_or_default().to_string();

    if !modality.accepts_filename(&original) {
        return Err(ApiError::bad_request(modality.invalid_format_message()));
    }
    let suffix = extension_of(&original).unwrap_or_default();

    let temp = tempfile::Builder::new()
        .prefix("dfguard-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| ApiError::internal(format!("Failed to create temp file: {}", e)))?;

    let handle = temp
        .reopen()
        .map_err(|e| ApiError::internal(format!("Failed to open temp file: {}", e)))?;
    let mut out = tokio::fs::File::from_std(handle);

    let mut bytes: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        bytes += chunk.len() as u64;
        out.write_all(&chunk)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;
    }
    out.flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;

    metrics::record_upload(modality.as_str(), bytes);
    info!(
        uid = %user.uid,
        modality = %modality,
        filename = %sanitize_filename(&original),
        bytes,
        "Upload persisted"
    );

    Ok(temp)
}
