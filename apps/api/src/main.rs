mod config;
mod errors;
mod form;
mod prediction;
mod routes;
mod state;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::prediction::{HttpPredictionClient, SessionStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Advisor API v{}", env!("CARGO_PKG_VERSION"));

    let predictor = HttpPredictionClient::new(
        &config.prediction_api_url,
        config.prediction_timeout,
        config.prediction_top_n,
        config.response_shape.clone(),
    )?;
    info!(
        "Prediction client initialized (endpoint: {}, timeout: {:?}, top_n: {}, shape: {:?})",
        predictor.endpoint(),
        config.prediction_timeout,
        config.prediction_top_n,
        config.response_shape
    );
    info!("Form validation profile: {:?}", config.form_profile);

    let session_ttl =
        chrono::Duration::from_std(config.session_ttl).context("SESSION_TTL_SECS is too large")?;

    let state = AppState {
        predictor: Arc::new(predictor),
        sessions: SessionStore::new(session_ttl),
        config: config.clone(),
    };

    let cors = build_cors(&config.allowed_origins)?;
    info!("CORS configured. Allowed origins: {:?}", config.allowed_origins);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS for the browser frontend. `*` in the list allows any origin.
fn build_cors(origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(AllowOrigin::any()));
    }

    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid origin in ALLOWED_ORIGINS: {o}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}
