//! Prediction client: the only place that talks to the external prediction service.
//!
//! One `POST {base}/predict` per submission, bounded by a timeout. Failures are
//! returned to the caller as-is; nothing here retries.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::prediction::normalizer::{normalize, PredictionSet, ResponseShape, ResponseShapeError};
use crate::prediction::payload::PredictPayload;

/// Longest error body kept from a failed call, in bytes.
const MAX_ERROR_BODY_BYTES: usize = 512;

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("prediction service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("prediction service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("prediction service returned a non-JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("unexpected response shape: {0}")]
    Shape(#[from] ResponseShapeError),
}

/// Something that can turn a payload into ranked predictions.
///
/// Carried in `AppState` as `Arc<dyn PredictionService>`.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(&self, payload: &PredictPayload) -> Result<PredictionSet, PredictionError>;
}

#[derive(Clone)]
pub struct HttpPredictionClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
    top_n: usize,
    shape: ResponseShape,
}

impl HttpPredictionClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        top_n: usize,
        shape: ResponseShape,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/predict", base_url.trim_end_matches('/')),
            timeout,
            top_n,
            shape,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn predict(&self, payload: &PredictPayload) -> Result<PredictionSet, PredictionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("top_n", self.top_n)])
            .json(payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            warn!("Prediction service returned {}: {}", status, body);
            return Err(PredictionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        let body: Value = serde_json::from_slice(&bytes)?;
        let predictions = normalize(&body, &self.shape, self.top_n)?;

        debug!(
            "Prediction call succeeded: models={:?}",
            predictions.models().collect::<Vec<_>>()
        );
        Ok(predictions)
    }
}

impl HttpPredictionClient {
    fn classify(&self, err: reqwest::Error) -> PredictionError {
        if err.is_timeout() {
            PredictionError::Timeout(self.timeout)
        } else {
            PredictionError::Http(err)
        }
    }
}

/// Reads at most `MAX_ERROR_BODY_BYTES` of a failed response.
async fn read_error_body(mut response: reqwest::Response) -> String {
    let mut buf = Vec::new();
    while buf.len() <= MAX_ERROR_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            _ => break,
        }
    }
    truncate_body(&buf)
}

fn truncate_body(bytes: &[u8]) -> String {
    if bytes.len() <= MAX_ERROR_BODY_BYTES {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    format!(
        "{}... (truncated)",
        String::from_utf8_lossy(&bytes[..MAX_ERROR_BODY_BYTES])
    )
}
