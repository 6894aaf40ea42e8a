//! Runtime settings for the structuring agent.
//!
//! Everything is read once from the environment (after `.env` is loaded) into
//! an explicit [`Settings`] value that gets handed to constructors.

use std::env;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_AGENT_NAME: &str = "OCRTextExtractionAgent";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_API_VERSION: &str = "2025-05-15-preview";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("AI_FOUNDRY_PROJECT_ENDPOINT environment variable not set")]
    MissingEndpoint,
    #[error("invalid project endpoint {0:?}")]
    InvalidEndpoint(String),
}

/// Connection and agent settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Project endpoint of the hosted inference service.
    pub endpoint: Option<String>,
    /// Model deployment the agent is bound to.
    pub model: String,
    pub agent_name: String,
    /// Sampling temperature; low for factual extraction.
    pub temperature: f32,
    pub api_version: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: DEFAULT_MODEL.to_string(),
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let temperature = match get("OCR_AGENT_TEMPERATURE") {
            Some(raw) => raw.trim().parse::<f32>().unwrap_or_else(|_| {
                warn!(
                    "Ignoring invalid OCR_AGENT_TEMPERATURE={:?}, using {}",
                    raw, DEFAULT_TEMPERATURE
                );
                DEFAULT_TEMPERATURE
            }),
            None => defaults.temperature,
        };

        Self {
            endpoint: get("AI_FOUNDRY_PROJECT_ENDPOINT")
                .map(|e| e.trim().trim_end_matches('/').to_string()),
            model: get("MODEL_DEPLOYMENT_NAME").unwrap_or(defaults.model),
            agent_name: get("OCR_AGENT_NAME").unwrap_or(defaults.agent_name),
            temperature,
            api_version: get("AI_FOUNDRY_API_VERSION").unwrap_or(defaults.api_version),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into().trim_end_matches('/').to_string());
        self
    }

    /// The endpoint, or an error if it was never configured.
    pub fn require_endpoint(&self) -> Result<&str, ConfigError> {
        self.endpoint.as_deref().ok_or(ConfigError::MissingEndpoint)
    }
}
