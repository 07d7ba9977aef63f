//! Application state.

use std::sync::Arc;

use dfguard_media::DeepfakeDetector;

use crate::auth::TokenVerifier;
use crate::config::ApiConfig;
use crate::services::IdentityClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub detector: Arc<dyn DeepfakeDetector>,
    pub verifier: Arc<dyn TokenVerifier>,
    /// `None` when no identity provider API key is configured.
    pub identity: Option<Arc<IdentityClient>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        config: ApiConfig,
        detector: Arc<dyn DeepfakeDetector>,
        verifier: Arc<dyn TokenVerifier>,
        identity: Option<Arc<IdentityClient>>,
    ) -> Self {
        Self {
            config,
            detector,
            verifier,
            identity,
        }
    }
}
