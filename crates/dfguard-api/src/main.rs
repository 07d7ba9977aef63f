//! Axum API server binary.

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use dfguard_media::{DeepfakeDetector, DetectionPipeline, ModelConfig, ModelRegistry, PipelineConfig};
use tracing::{error, info, warn};

use dfguard_api::auth::GOOGLE_JWKS_URL;
use dfguard_api::logging::init_tracing;
use dfguard_api::{
    create_router, metrics, ApiConfig, AppState, IdentityClient, JwksCache, TokenVerifier,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Failed to install rustls crypto provider");
        process::exit(1);
    }

    init_tracing();

    info!("Starting dfguard-api");

    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    // Models are loaded once, before the listener binds
    let pipeline_config = PipelineConfig::from_env();
    let models = match ModelConfig::from_env().and_then(|paths| ModelRegistry::load(&paths)) {
        Ok(models) => models,
        Err(e) => {
            error!("Failed to load models: {}", e);
            process::exit(1);
        }
    };
    let detector: Arc<dyn DeepfakeDetector> =
        Arc::new(DetectionPipeline::new(models, pipeline_config));

    let Some(project_id) = config.firebase_project_id.clone() else {
        error!("FIREBASE_PROJECT_ID must be set");
        process::exit(1);
    };
    let verifier: Arc<dyn TokenVerifier> = match JwksCache::new(project_id, GOOGLE_JWKS_URL).await {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            error!("Failed to initialize token verifier: {}", e);
            process::exit(1);
        }
    };

    let identity = match config.firebase_api_key.as_deref() {
        Some(api_key) => match IdentityClient::new(api_key, config.identity_toolkit_url.as_str()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                error!("Failed to create identity client: {}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("FIREBASE_API_KEY not set; /register is disabled");
            None
        }
    };

    let metrics_handle = if config.metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => {
                info!("Prometheus metrics enabled at /metrics");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install metrics recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address: {}", e);
            process::exit(1);
        }
    };

    let state = AppState::new(config, detector, verifier, identity);
    let app = create_router(state, metrics_handle);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            process::exit(1);
        }
    };
    info!("Listening on {}", addr);

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        error!("Server error: {}", e);
        process::exit(1);
    }

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
