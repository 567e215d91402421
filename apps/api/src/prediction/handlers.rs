//! Axum route handlers for the Prediction API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::form::{form_schema, validate_form, FormSchema, RawStudentForm};
use crate::prediction::payload::PredictPayload;
use crate::prediction::session::{Applied, PredictionSession};
use crate::prediction::PredictionSet;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predictions: PredictionSet,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: PredictionSession,
    pub in_flight: bool,
}

impl From<PredictionSession> for SessionResponse {
    fn from(session: PredictionSession) -> Self {
        let in_flight = session.is_in_flight();
        Self { session, in_flight }
    }
}

/// GET /api/v1/form
pub async fn handle_form_schema(State(state): State<AppState>) -> Json<FormSchema> {
    Json(form_schema(state.config.form_profile))
}

/// POST /api/v1/predict
pub async fn handle_predict(
    State(state): State<AppState>,
    Json(raw): Json<RawStudentForm>,
) -> Result<Json<PredictResponse>, AppError> {
    let profile = validate_form(&raw, state.config.form_profile).map_err(AppError::Validation)?;
    let payload = PredictPayload::from_profile(&profile);

    let predictions = state.predictor.predict(&payload).await?;
    info!("Prediction returned results for {:?}", predictions.models().collect::<Vec<_>>());
    Ok(Json(PredictResponse { predictions }))
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionResponse>) {
    let session = state.sessions.create().await;
    (StatusCode::CREATED, Json(session.into()))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.sessions.get(id).await.ok_or_else(|| session_not_found(id))?;
    Ok(Json(session.into()))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id).await {
        return Err(session_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/submit
///
/// Validation failures are recorded on the session and returned with 200; the
/// snapshot's `errors` carry the per-field messages.
///
/// The upstream call and its completion run on their own task, so a client
/// that disconnects mid-request cannot leave the session in `submitting`.
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(raw): Json<RawStudentForm>,
) -> Result<Json<SessionResponse>, AppError> {
    let profile = state.config.form_profile;

    let dispatched = state
        .sessions
        .update(id, |session| {
            let ticket = session.begin();
            match validate_form(&raw, profile) {
                Ok(student) => {
                    session.dispatch(ticket);
                    Some((ticket, PredictPayload::from_profile(&student)))
                }
                Err(errors) => {
                    info!("Session {id} submission rejected: {} invalid fields", errors.len());
                    session.reject(ticket, errors);
                    None
                }
            }
        })
        .await
        .ok_or_else(|| session_not_found(id))?;

    if let Some((ticket, payload)) = dispatched {
        let predictor = state.predictor.clone();
        let sessions = state.sessions.clone();
        let completion = tokio::spawn(async move {
            let outcome = predictor.predict(&payload).await;
            if let Err(e) = &outcome {
                warn!("Prediction for session {id} failed: {e}");
            }

            let applied = sessions
                .update(id, |session| session.complete(ticket, outcome))
                .await;
            if applied == Some(Applied::Stale) {
                info!("Session {id} moved on before its prediction returned");
            }
        });
        if let Err(e) = completion.await {
            error!("Prediction task for session {id} failed: {e}");
        }
    }

    let session = state.sessions.get(id).await.ok_or_else(|| session_not_found(id))?;
    Ok(Json(session.into()))
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}
