//! Account registration.

use axum::extract::State;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::security::{is_strong_password, WEAK_PASSWORD_MESSAGE};
use crate::services::IdentityError;
use crate::state::AppState;

/// Registration form.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
}

/// Registration response.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub uid: String,
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> ApiResult<Json<RegisterResponse>> {
    form.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if !is_strong_password(&form.password) {
        return Err(ApiError::bad_request(WEAK_PASSWORD_MESSAGE));
    }

    let identity = state
        .identity
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Registration is not configured"))?;

    let uid = identity
        .sign_up(&form.email, &form.password)
        .await
        .map_err(|e| match e {
            IdentityError::EmailExists => ApiError::bad_request(e.to_string()),
            IdentityError::Rejected(msg) => {
                ApiError::bad_request(format!("Firebase registration error: {}", msg))
            }
            IdentityError::Transport(err) => {
                warn!("Identity provider unreachable: {}", err);
                ApiError::service_unavailable("Identity provider unavailable")
            }
        })?;

    info!(uid = %uid, "User registered");

    Ok(Json(RegisterResponse {
        message: "User registered successfully",
        uid,
    }))
}
