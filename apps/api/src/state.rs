use std::sync::Arc;

use crate::config::Config;
use crate::prediction::{PredictionService, SessionStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable prediction backend. Default: `HttpPredictionClient`.
    pub predictor: Arc<dyn PredictionService>,
    pub sessions: SessionStore,
}
