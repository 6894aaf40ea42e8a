//! HTTP client for a hosted agent project (agents + responses endpoints).

use crate::agent::{AgentDefinition, AgentHandle, AgentService, TransportError};
use crate::config::{ConfigError, Settings};
use crate::credential::Credential;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Agent project client for agent registration and responses.
#[derive(Clone)]
pub struct FoundryClient {
    client: Client,
    settings: Settings,
    credential: Option<Credential>,
}

impl FoundryClient {
    /// Build a client. Missing endpoint or credential surfaces on first request.
    pub fn new(settings: &Settings, credential: Option<Credential>) -> Self {
        Self {
            client: Client::new(),
            settings: settings.clone(),
            credential,
        }
    }

    /// Build a client from `Settings::from_env()` and the environment credential.
    pub fn from_env(settings: &Settings) -> Self {
        Self::new(settings, Credential::from_env())
    }

    /// Endpoint URL with each segment percent-encoded and `api-version` set.
    fn url(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let endpoint = self.settings.require_endpoint()?;
        let invalid = || ConfigError::InvalidEndpoint(endpoint.to_string());

        let mut url = Url::parse(endpoint).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("api-version", &self.settings.api_version);
        Ok(url)
    }

    async fn post_json<B, R>(&self, segments: &[&str], body: &B) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(segments)?;
        let credential = self.credential.as_ref().ok_or_else(|| {
            TransportError::Credential(
                "no credential configured (set AZURE_AI_ACCESS_TOKEN or AZURE_TENANT_ID/AZURE_CLIENT_ID/AZURE_CLIENT_SECRET)"
                    .to_string(),
            )
        })?;
        let token = credential.access_token(&self.client).await?;
        let request_id = Uuid::new_v4().to_string();

        debug!("POST {} (request id {})", url, request_id);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header("x-ms-client-request-id", &request_id)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            TransportError::InvalidResponse(format!(
                "{} (request id {}): {}",
                e,
                request_id,
                text.chars().take(200).collect::<String>()
            ))
        })
    }
}

#[async_trait::async_trait]
impl AgentService for FoundryClient {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<AgentHandle, TransportError> {
        let request = CreateVersionRequest {
            definition: PromptDefinition {
                kind: "prompt",
                model: &definition.model,
                instructions: &definition.instructions,
                temperature: definition.temperature,
            },
        };

        let response: AgentVersionResponse = self
            .post_json(&["agents", definition.name.as_str(), "versions"], &request)
            .await?;
        let handle = response.into_handle(&definition.name);

        info!(
            "Registered agent {} (version {}) on model {}",
            handle.name, handle.version, definition.model
        );
        Ok(handle)
    }

    async fn respond(&self, agent: &AgentHandle, input: &str) -> Result<String, TransportError> {
        let request = ResponsesRequest {
            input,
            agent_reference: AgentReference {
                name: &agent.name,
                kind: "agent_reference",
            },
        };

        let response: ResponsesResponse = self.post_json(&["openai", "responses"], &request).await?;

        if let Some(usage) = &response.usage {
            info!(
                "Agent response: {} tokens (input: {}, output: {})",
                usage.total_tokens, usage.input_tokens, usage.output_tokens
            );
        }

        response
            .text()
            .ok_or_else(|| TransportError::InvalidResponse("response contained no output text".to_string()))
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct CreateVersionRequest<'a> {
    definition: PromptDefinition<'a>,
}

#[derive(Debug, Serialize)]
struct PromptDefinition<'a> {
    kind: &'static str,
    model: &'a str,
    instructions: &'a str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct AgentVersionResponse {
    #[serde(default)]
    name: Option<String>,
    /// Some API versions send a number, others a string.
    #[serde(default)]
    version: serde_json::Value,
}

impl AgentVersionResponse {
    fn into_handle(self, requested_name: &str) -> AgentHandle {
        let version = match self.version {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => "unknown".to_string(),
            other => other.to_string(),
        };
        AgentHandle {
            name: self.name.unwrap_or_else(|| requested_name.to_string()),
            version,
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    input: &'a str,
    agent_reference: AgentReference<'a>,
}

#[derive(Debug, Serialize)]
struct AgentReference<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl ResponsesResponse {
    /// Reply text: the `output_text` shortcut, else all message text parts joined.
    fn text(self) -> Option<String> {
        if let Some(text) = self.output_text {
            return Some(text);
        }
        let parts: Vec<String> = self
            .output
            .into_iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content)
            .filter(|c| c.kind == "output_text")
            .filter_map(|c| c.text)
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.concat())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_version_body() {
        let request = CreateVersionRequest {
            definition: PromptDefinition {
                kind: "prompt",
                model: "gpt-4o-mini",
                instructions: "be terse",
                temperature: 0.5,
            },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"definition": {"kind": "prompt", "model": "gpt-4o-mini", "instructions": "be terse", "temperature": 0.5}})
        );
    }

    #[test]
    fn test_responses_body_references_agent() {
        let request = ResponsesRequest {
            input: "hello",
            agent_reference: AgentReference {
                name: "OCRTextExtractionAgent",
                kind: "agent_reference",
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["input"], "hello");
        assert_eq!(value["agent_reference"]["type"], "agent_reference");
        assert_eq!(value["agent_reference"]["name"], "OCRTextExtractionAgent");
    }

    #[test]
    fn test_version_number_or_string() {
        let numeric: AgentVersionResponse =
            serde_json::from_value(json!({"name": "A", "version": 3})).unwrap();
        assert_eq!(numeric.into_handle("A").version, "3");

        let missing: AgentVersionResponse = serde_json::from_value(json!({})).unwrap();
        let handle = missing.into_handle("Fallback");
        assert_eq!(handle.name, "Fallback");
        assert_eq!(handle.version, "unknown");
    }

    #[test]
    fn test_output_text_shortcut_preferred() {
        let resp: ResponsesResponse =
            serde_json::from_value(json!({"output_text": "{}", "output": []})).unwrap();
        assert_eq!(resp.text().as_deref(), Some("{}"));
    }

    #[test]
    fn test_output_items_joined() {
        let resp: ResponsesResponse = serde_json::from_value(json!({
            "output": [
                {"type": "reasoning", "content": [{"type": "output_text", "text": "ignored"}]},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "{\"a\":"},
                    {"type": "refusal"},
                    {"type": "output_text", "text": " 1}"}
                ]}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();
        assert_eq!(resp.text().as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_no_text_in_response() {
        let resp: ResponsesResponse = serde_json::from_value(json!({"output": []})).unwrap();
        assert!(resp.text().is_none());
    }

    fn client_for(endpoint: &str) -> FoundryClient {
        FoundryClient::new(&Settings::default().with_endpoint(endpoint), None)
    }

    #[test]
    fn test_url_appends_segments_and_api_version() {
        let client = client_for("https://example.services.ai.azure.com/api/projects/p1/");
        let url = client.url(&["agents", "OCRTextExtractionAgent", "versions"]).unwrap();
        assert_eq!(
            url.as_str(),
            format!(
                "https://example.services.ai.azure.com/api/projects/p1/agents/OCRTextExtractionAgent/versions?api-version={}",
                crate::config::DEFAULT_API_VERSION
            )
        );
    }

    #[test]
    fn test_agent_name_is_percent_encoded() {
        let client = client_for("https://example.invalid/api/projects/p1");
        let url = client.url(&["agents", "ocr/../admin?x=1#frag", "versions"]).unwrap();
        assert_eq!(url.path(), "/api/projects/p1/agents/ocr%2F..%2Fadmin%3Fx=1%23frag/versions");
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query_pairs().count(), 1);
    }

    #[test]
    fn test_unparseable_endpoint() {
        let client = client_for("not a url");
        let err = client.url(&["openai", "responses"]).unwrap_err();
        assert!(matches!(err, TransportError::Config(ConfigError::InvalidEndpoint(_))));
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_transport_error() {
        let client = FoundryClient::new(&Settings::default(), Some(Credential::Static("t".into())));
        let err = client
            .respond(
                &AgentHandle {
                    name: "A".into(),
                    version: "1".into(),
                },
                "hi",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Config(ConfigError::MissingEndpoint)));
    }

    #[tokio::test]
    async fn test_missing_credential_is_transport_error() {
        let settings = Settings::default().with_endpoint("https://example.invalid/api/projects/p");
        let client = FoundryClient::new(&settings, None);
        let definition = AgentDefinition {
            name: "A".into(),
            model: "m".into(),
            instructions: "i".into(),
            temperature: 0.1,
        };
        let err = client.create_agent(&definition).await.unwrap_err();
        assert!(matches!(err, TransportError::Credential(_)));
    }
}
