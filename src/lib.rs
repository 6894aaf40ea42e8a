//! OCR Structurer - turns raw OCR text into a normalized JSON document via a
//! hosted LLM agent.

pub mod agent;
pub mod config;
pub mod credential;
pub mod foundry;
pub mod normalize;
pub mod ocr_input;
pub mod outcome;
pub mod output;
pub mod prompt;
pub mod structurer;

pub use agent::{AgentDefinition, AgentHandle, AgentService, TransportError};
pub use config::Settings;
pub use foundry::FoundryClient;
pub use outcome::{ErrorKind, ErrorResult, Outcome};
pub use structurer::Structurer;
