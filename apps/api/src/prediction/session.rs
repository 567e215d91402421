//! Submission lifecycle for one form.
//!
//! Idle → Validating → (invalid) Idle with field errors
//!                   → (valid) Submitting → Displaying, or Idle with an error message
//!
//! Every submission takes a `Ticket`. Only the latest ticket may change the
//! session, so a slow response from a superseded submission is discarded.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::form::FieldErrors;
use crate::prediction::client::PredictionError;
use crate::prediction::normalizer::PredictionSet;

/// Shown for any network or response failure. Details go to the log only.
pub const GENERIC_FAILURE: &str = "Failed to get prediction. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Idle,
    Validating,
    Submitting,
    Displaying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Whether a transition was applied or ignored as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionSession {
    pub id: Uuid,
    pub status: SubmissionStatus,
    pub errors: FieldErrors,
    pub error_message: Option<String>,
    pub last_result: Option<PredictionSet>,
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PredictionSession {
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: SubmissionStatus::Idle,
            errors: FieldErrors::default(),
            error_message: None,
            last_result: None,
            sequence: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Starts a new submission. Clears the previous result and any errors.
    pub fn begin(&mut self) -> Ticket {
        self.sequence += 1;
        self.status = SubmissionStatus::Validating;
        self.errors = FieldErrors::default();
        self.error_message = None;
        self.last_result = None;
        self.touch();
        Ticket(self.sequence)
    }

    pub fn reject(&mut self, ticket: Ticket, errors: FieldErrors) -> Applied {
        if !self.is_current(ticket, SubmissionStatus::Validating) {
            return Applied::Stale;
        }
        self.status = SubmissionStatus::Idle;
        self.errors = errors;
        self.touch();
        Applied::Current
    }

    pub fn dispatch(&mut self, ticket: Ticket) -> Applied {
        if !self.is_current(ticket, SubmissionStatus::Validating) {
            return Applied::Stale;
        }
        self.status = SubmissionStatus::Submitting;
        self.touch();
        Applied::Current
    }

    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<PredictionSet, PredictionError>,
    ) -> Applied {
        if !self.is_current(ticket, SubmissionStatus::Submitting) {
            debug!(
                "Discarding response for submission {} (latest is {})",
                ticket.0, self.sequence
            );
            return Applied::Stale;
        }
        match outcome {
            Ok(result) => {
                self.status = SubmissionStatus::Displaying;
                self.last_result = Some(result);
            }
            Err(_) => {
                self.status = SubmissionStatus::Idle;
                self.last_result = None;
                self.error_message = Some(GENERIC_FAILURE.to_string());
            }
        }
        self.touch();
        Applied::Current
    }

    /// True while a request is outstanding; a UI should disable submit.
    pub fn is_in_flight(&self) -> bool {
        self.status == SubmissionStatus::Submitting
    }

    fn is_current(&self, ticket: Ticket, expected: SubmissionStatus) -> bool {
        ticket.0 == self.sequence && self.status == expected
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// In-memory sessions keyed by id. Nothing is persisted.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, PredictionSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Creates a session, dropping any that have been idle longer than the TTL.
    pub async fn create(&self) -> PredictionSession {
        let session = PredictionSession::new(Uuid::new_v4());
        let mut sessions = self.inner.write().await;

        // A TTL reaching past the earliest representable time never expires.
        if let Some(cutoff) = Utc::now().checked_sub_signed(self.ttl) {
            let before = sessions.len();
            sessions.retain(|_, s| s.updated_at >= cutoff);
            let pruned = before - sessions.len();
            if pruned > 0 {
                info!("Pruned {pruned} expired prediction sessions");
            }
        }

        sessions.insert(session.id, session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<PredictionSession> {
        self.inner.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    /// Runs `f` against the session under the write lock.
    /// Returns `None` if the session does not exist.
    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut PredictionSession) -> T,
    ) -> Option<T> {
        self.inner.write().await.get_mut(&id).map(f)
    }
}
