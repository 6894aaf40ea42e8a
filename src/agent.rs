//! Agent service abstraction.
//!
//! The pipeline only needs two things from the remote side: register (or
//! fetch) a named agent, and send it one request. [`AgentService`] is that
//! seam; [`crate::foundry::FoundryClient`] is the HTTP implementation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration an agent is registered with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDefinition {
    pub name: String,
    pub model: String,
    pub instructions: String,
    pub temperature: f32,
}

/// Reference to a registered agent version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentHandle {
    pub name: String,
    /// Version assigned by the service; opaque to us.
    pub version: String,
}

/// Any failure talking to the remote service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("credential error: {0}")]
    Credential(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Remote agent operations the pipeline depends on.
#[async_trait::async_trait]
pub trait AgentService: Send + Sync {
    /// Create or fetch the agent named in `definition`.
    ///
    /// The service may hand back an existing agent or a new version of it.
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<AgentHandle, TransportError>;

    /// Send one user message to the agent and return its reply text.
    async fn respond(&self, agent: &AgentHandle, input: &str) -> Result<String, TransportError>;
}
