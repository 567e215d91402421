pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::prediction::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/form", get(handlers::handle_form_schema))
        .route("/api/v1/predict", post(handlers::handle_predict))
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_reset_session),
        )
        .route("/api/v1/sessions/:id/submit", post(handlers::handle_submit))
        .with_state(state)
}
