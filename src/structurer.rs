//! OCR text structuring pipeline.
//!
//! OCR text → prompt → agent reply → JSON object → metadata stamp. Failures at
//! any step come back as [`Outcome::Failed`] rather than an `Err`.

use crate::agent::{AgentDefinition, AgentHandle, AgentService, TransportError};
use crate::config::Settings;
use crate::normalize::{normalize_response, stamp_metadata};
use crate::ocr_input::OcrStageResult;
use crate::outcome::{Outcome, StructureError};
use crate::prompt;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, info, warn};

const UNKNOWN_ERROR: &str = "Unknown error";

/// Pipeline orchestrator bound to one agent service.
pub struct Structurer<A> {
    service: A,
    settings: Settings,
    /// Agent handles registered by this process, keyed by agent name.
    agents: Mutex<HashMap<String, AgentHandle>>,
}

impl<A: AgentService> Structurer<A> {
    pub fn new(service: A, settings: Settings) -> Self {
        Self {
            service,
            settings,
            agents: Mutex::new(HashMap::new()),
        }
    }

    /// Reuse an agent that was registered elsewhere instead of creating one.
    pub fn with_agent(self, handle: AgentHandle) -> Self {
        self.agents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.name.clone(), handle);
        self
    }

    pub fn service(&self) -> &A {
        &self.service
    }

    /// Agent definition built from settings and the fixed instructions.
    pub fn definition(&self) -> AgentDefinition {
        AgentDefinition {
            name: self.settings.agent_name.clone(),
            model: self.settings.model.clone(),
            instructions: prompt::agent_instructions().to_string(),
            temperature: self.settings.temperature,
        }
    }

    /// Create-or-fetch the agent, registering it at most once per process.
    pub async fn agent(&self) -> Result<AgentHandle, TransportError> {
        let definition = self.definition();
        if let Some(handle) = self.cached_agent(&definition.name) {
            debug!("Reusing agent {} (version {})", handle.name, handle.version);
            return Ok(handle);
        }

        info!("Registering agent {}", definition.name);
        let handle = self.service.create_agent(&definition).await?;

        let mut agents = self.agents.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(agents
            .entry(definition.name)
            .or_insert(handle)
            .clone())
    }

    fn cached_agent(&self, name: &str) -> Option<AgentHandle> {
        self.agents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Structure raw OCR text.
    pub async fn structure_text(&self, ocr_text: &str, source_file: Option<&str>) -> Outcome {
        match self.try_structure(ocr_text, source_file).await {
            Ok(structured) => {
                info!("Structured OCR text from {}", source_file.unwrap_or("unknown source"));
                Outcome::Structured(structured)
            }
            Err(e) => {
                error!("Structuring failed: {}", e);
                Outcome::Failed(e.into_result(source_file, Some(&self.settings.model)))
            }
        }
    }

    async fn try_structure(
        &self,
        ocr_text: &str,
        source_file: Option<&str>,
    ) -> Result<Map<String, Value>, StructureError> {
        if ocr_text.is_empty() {
            return Err(StructureError::EmptyInput);
        }

        info!(
            "Processing OCR text from: {}",
            source_file.unwrap_or("unknown source")
        );

        let agent = self.agent().await?;
        let input = prompt::user_message(ocr_text);

        debug!("Sending {} chars to agent {}", input.len(), agent.name);
        let response = self.service.respond(&agent, &input).await?;
        debug!("Raw agent response length: {} chars", response.len());

        let mut structured = normalize_response(&response)?;
        stamp_metadata(
            &mut structured,
            source_file,
            &self.settings.model,
            ocr_text.chars().count(),
        );
        Ok(structured)
    }

    /// Structure the text of a serialized OCR stage result.
    pub async fn process_ocr_result(&self, ocr_result_json: &str) -> Outcome {
        match serde_json::from_str::<OcrStageResult>(ocr_result_json) {
            Ok(stage) => self.process_stage(&stage, None).await,
            Err(e) => {
                warn!("Invalid OCR result JSON: {}", e);
                Outcome::Failed(StructureError::from(e).into_result(None, None))
            }
        }
    }

    /// Gate on the OCR stage status, then structure its text.
    ///
    /// `fallback_source` labels the result when the stage carries no `file_path`.
    pub async fn process_stage(
        &self,
        stage: &OcrStageResult,
        fallback_source: Option<&str>,
    ) -> Outcome {
        let source_file = stage.file_path().or(fallback_source);

        if !stage.is_success() {
            let message = stage
                .error_message()
                .map(|m| m.into_owned())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            warn!("OCR stage reported failure: {}", message);
            return Outcome::Failed(
                StructureError::UpstreamStatus(message).into_result(source_file, None),
            );
        }

        let text = stage.text();
        if text.is_empty() {
            warn!("OCR stage succeeded but produced no text");
            return Outcome::Failed(StructureError::EmptyInput.into_result(source_file, None));
        }

        self.structure_text(&text, source_file).await
    }
}
