//! Reasoning engine interface
//!
//! Defines the data exchanged between the agent loop and the external
//! reasoning engine (tool invocations, tool results, decisions) and the
//! [`Provider`] trait the loop drives.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use thiserror::Error;

pub mod openai;

pub use openai::OpenAiProvider;

/// Reasoning engine errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("engine rejected request: {0}")]
    Api(String),

    #[error("no API key configured")]
    NoApiKey,

    #[error("invalid engine response")]
    InvalidResponse,

    #[error("rate limited")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// A single request to run one tool with specific input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    pub invocation_id: String,
    pub tool_name: String,
    pub input: Value,
}

impl ToolInvocationRequest {
    pub fn new(invocation_id: impl Into<String>, tool_name: impl Into<String>, input: Value) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            tool_name: tool_name.into(),
            input,
        }
    }
}

/// Result status flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Payload of a finished invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum ToolOutcome {
    Success(Value),
    Error(String),
}

/// Envelope produced for every invocation, successful or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub invocation_id: String,
    pub tool_name: String,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

impl ToolResult {
    pub fn success(
        invocation_id: impl Into<String>,
        tool_name: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            tool_name: tool_name.into(),
            outcome: ToolOutcome::Success(value),
        }
    }

    pub fn error(
        invocation_id: impl Into<String>,
        tool_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            tool_name: tool_name.into(),
            outcome: ToolOutcome::Error(message.into()),
        }
    }

    pub fn status(&self) -> ToolStatus {
        match self.outcome {
            ToolOutcome::Success(_) => ToolStatus::Success,
            ToolOutcome::Error(_) => ToolStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == ToolStatus::Success
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.outcome {
            ToolOutcome::Success(value) => Some(value),
            ToolOutcome::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            ToolOutcome::Success(_) => None,
            ToolOutcome::Error(message) => Some(message),
        }
    }

    /// Text form handed back to the engine
    pub fn content(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success(Value::String(s)) => s.clone(),
            ToolOutcome::Success(value) => value.to_string(),
            ToolOutcome::Error(message) => format!("Error: {}", message),
        }
    }
}

/// One tool-dispatch step: the issued requests and their results, in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchRound {
    pub requests: Vec<ToolInvocationRequest>,
    pub results: Vec<ToolResult>,
}

/// Tool call proposed by the engine, before the agent assigns an invocation id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// What the engine wants to do next
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    FinalAnswer(String),
    ToolCalls(Vec<ToolCall>),
}

/// Tool description presented to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool input
    pub parameters: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Everything the engine sees for one Reasoning step
#[derive(Debug, Clone, Default)]
pub struct ReasoningRequest {
    pub system_prompt: Option<String>,
    pub user_message: String,
    pub rounds: Vec<DispatchRound>,
    pub tools: Vec<ToolSpec>,
}

impl ReasoningRequest {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            ..Default::default()
        }
    }

    /// Accumulated tool results across all rounds, in issue order
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.rounds.iter().flat_map(|round| round.results.iter())
    }
}

/// External reasoning engine
#[async_trait]
pub trait Provider: Send + Sync {
    async fn decide(&self, request: ReasoningRequest) -> Result<Decision>;
    fn model(&self) -> String;
    fn is_configured(&self) -> bool;
}
