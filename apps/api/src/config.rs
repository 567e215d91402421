use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::form::ValidationProfile;
use crate::prediction::ResponseShape;

const DEFAULT_ALLOWED_ORIGINS: &str =
    "http://localhost:5173,http://127.0.0.1:5173,http://localhost:3000";

/// Application configuration loaded from environment variables.
/// Startup fails if `PREDICTION_API_URL` is missing or any value is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub prediction_api_url: String,
    pub prediction_timeout: Duration,
    pub prediction_top_n: usize,
    pub response_shape: ResponseShape,
    pub form_profile: ValidationProfile,
    pub allowed_origins: Vec<String>,
    pub session_ttl: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let prediction_api_url = lookup("PREDICTION_API_URL")
            .filter(|v| !v.trim().is_empty())
            .with_context(|| "Required environment variable 'PREDICTION_API_URL' is not set")?;

        let timeout_secs: u64 = var("PREDICTION_TIMEOUT_SECS", "20")
            .parse()
            .context("PREDICTION_TIMEOUT_SECS must be a whole number of seconds")?;
        if timeout_secs == 0 {
            return Err(anyhow!("PREDICTION_TIMEOUT_SECS must be greater than zero"));
        }

        let prediction_top_n: usize = var("PREDICTION_TOP_N", "3")
            .parse()
            .context("PREDICTION_TOP_N must be a positive integer")?;
        if prediction_top_n == 0 {
            return Err(anyhow!("PREDICTION_TOP_N must be greater than zero"));
        }

        let mut response_shape = var("PREDICTION_RESPONSE_SHAPE", "flat")
            .parse::<ResponseShape>()
            .map_err(|e| anyhow!("PREDICTION_RESPONSE_SHAPE: {e}"))?;
        if let ResponseShape::Single { model } = &mut response_shape {
            if let Some(name) = lookup("PREDICTION_MODEL_NAME").filter(|v| !v.trim().is_empty()) {
                *model = name.trim().to_string();
            }
        }

        let form_profile = var("FORM_PROFILE", "strict")
            .parse::<ValidationProfile>()
            .map_err(|e| anyhow!("FORM_PROFILE: {e}"))?;

        let allowed_origins = var("ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS)
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .fold(Vec::new(), |mut acc: Vec<String>, origin| {
                if !acc.iter().any(|o| o == origin) {
                    acc.push(origin.to_string());
                }
                acc
            });

        let session_ttl_secs: u64 = var("SESSION_TTL_SECS", "1800")
            .parse()
            .context("SESSION_TTL_SECS must be a whole number of seconds")?;

        Ok(Config {
            prediction_api_url: prediction_api_url.trim().to_string(),
            prediction_timeout: Duration::from_secs(timeout_secs),
            prediction_top_n,
            response_shape,
            form_profile,
            allowed_origins,
            session_ttl: Duration::from_secs(session_ttl_secs),
            port: var("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
        })
    }
}
