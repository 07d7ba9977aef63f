//! Axum HTTP API server for deepfake detection.
//!
//! This crate provides:
//! - Authenticated upload endpoints for video, image and audio prediction
//! - Account registration through the identity provider
//! - Firebase ID token verification
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use auth::{AuthError, AuthUser, JwksCache, TokenVerifier};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{IdentityClient, IdentityError};
pub use state::AppState;
