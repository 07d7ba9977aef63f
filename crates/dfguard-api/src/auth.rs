//! Firebase ID token authentication.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Google JWKS URL for Firebase Auth.
pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Firebase token issuer prefix.
const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// JWKS cache TTL.
const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600); // 1 hour

/// Message returned for every rejected bearer token.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid Firebase token";

/// Why a token was rejected. Logged, never returned to clients.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token header: {0}")]
    InvalidHeader(String),

    #[error("token missing key ID")]
    MissingKeyId,

    #[error("unknown key ID {0}")]
    UnknownKeyId(String),

    #[error("token validation failed: {0}")]
    Validation(String),

    #[error("JWKS fetch failed: {0}")]
    KeyFetch(String),
}

/// Decoded Firebase ID token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    /// User ID
    pub sub: String,
    /// Email (if available)
    pub email: Option<String>,
    /// Email verified
    pub email_verified: Option<bool>,
    /// Issuer
    pub iss: String,
    /// Audience (Firebase project ID)
    pub aud: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

impl From<FirebaseClaims> for AuthUser {
    fn from(claims: FirebaseClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
        }
    }
}

/// Bearer token verification.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError>;
}

/// JWKS response from Google.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkKey>,
}

#[derive(Debug, Clone, Deserialize)]
struct JwkKey {
    kid: String,
    n: String,
    e: String,
}

/// Firebase token verifier with cached JWKS keys.
pub struct JwksCache {
    http: Client,
    jwks_url: String,
    keys: RwLock<HashMap<String, DecodingKey>>,
    last_refresh: RwLock<Instant>,
    project_id: String,
}

impl JwksCache {
    /// Create a cache for `project_id` and fetch the initial key set.
    pub async fn new(
        project_id: impl Into<String>,
        jwks_url: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        let cache = Self {
            http,
            jwks_url: jwks_url.into(),
            keys: RwLock::new(HashMap::new()),
            last_refresh: RwLock::new(Instant::now()),
            project_id: project_id.into(),
        };

        // Initial key refresh
        cache.refresh_keys().await?;

        Ok(cache)
    }

    /// Refresh JWKS keys.
    async fn refresh_keys(&self) -> Result<(), AuthError> {
        debug!("Refreshing JWKS keys");

        let jwks: JwksResponse = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(e) => warn!(kid = %jwk.kid, "Skipping malformed JWK: {}", e),
            }
        }

        let key_count = keys.len();
        *self.keys.write().await = keys;
        *self.last_refresh.write().await = Instant::now();

        debug!("Refreshed {} JWKS keys", key_count);
        Ok(())
    }

    /// Get decoding key for a key ID.
    async fn get_key(&self, kid: &str) -> Option<DecodingKey> {
        let needs_refresh = {
            let last = self.last_refresh.read().await;
            last.elapsed() > JWKS_CACHE_TTL
        };

        if needs_refresh {
            if let Err(e) = self.refresh_keys().await {
                warn!("Failed to refresh JWKS keys: {}", e);
            }
        }

        self.keys.read().await.get(kid).cloned()
    }
}

#[async_trait]
impl TokenVerifier for JwksCache {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidHeader(e.to_string()))?;

        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let key = self
            .get_key(&kid)
            .await
            .ok_or_else(|| AuthError::UnknownKeyId(kid.clone()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[format!("{}{}", FIREBASE_ISSUER_PREFIX, self.project_id)]);
        validation.set_audience(&[&self.project_id]);

        let token_data = decode::<FirebaseClaims>(token, &key, &validation)
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        Ok(AuthUser::from(token_data.claims))
    }
}

/// Axum extractor for authenticated user.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::unauthorized("Not authenticated"))?;

        state.verifier.verify(bearer.token()).await.map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            ApiError::unauthorized(INVALID_TOKEN_MESSAGE)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Header `{"alg":"RS256","kid":"unknown-kid","typ":"JWT"}`.
    const UNKNOWN_KID_TOKEN: &str =
        "eyJhbGciOiJSUzI1NiIsImtpZCI6InVua25vd24ta2lkIiwidHlwIjoiSldUIn0.eyJzdWIiOiJ1MSJ9.c2ln";

    /// Header `{"alg":"RS256","kid":"key-1","typ":"JWT"}` with a bogus signature.
    const KNOWN_KID_TOKEN: &str =
        "eyJhbGciOiJSUzI1NiIsImtpZCI6ImtleS0xIiwidHlwIjoiSldUIn0.eyJzdWIiOiJ1MSJ9.c2ln";

    async fn jwks_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "keys": [{
                    "kid": "key-1",
                    "kty": "RSA",
                    "alg": "RS256",
                    "n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw",
                    "e": "AQAB"
                }]
            })))
            .mount(&server)
            .await;
        server
    }

    async fn cache(server: &MockServer) -> JwksCache {
        JwksCache::new("demo-project", format!("{}/jwks", server.uri()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let server = jwks_server().await;
        let verifier = cache(&server).await;
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(AuthError::InvalidHeader(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_key_id_rejected() {
        let server = jwks_server().await;
        let verifier = cache(&server).await;
        assert!(matches!(
            verifier.verify(UNKNOWN_KID_TOKEN).await,
            Err(AuthError::UnknownKeyId(kid)) if kid == "unknown-kid"
        ));
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let server = jwks_server().await;
        let verifier = cache(&server).await;
        assert!(matches!(
            verifier.verify(KNOWN_KID_TOKEN).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_jwks_outage_fails_construction() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = JwksCache::new("demo-project", format!("{}/jwks", server.uri())).await;
        assert!(matches!(result, Err(AuthError::KeyFetch(_))));
    }
}
