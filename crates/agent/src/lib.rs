//! Agent core
//!
//! Tool registry, tool executor and the per-turn reasoning loop.

use std::time::Duration;
use thiserror::Error;

pub mod executor;
pub mod loop_agent;
pub mod tools;

pub use executor::ToolExecutor;
pub use loop_agent::{AgentLoop, AgentTurn, TurnState};
pub use tools::{
    default_registry, register_default_tools, ParamSpec, ParamType, ToolDescriptor, ToolHandler,
    ToolRegistry, ToolSchema,
};

/// Tool errors
///
/// Only `DuplicateTool` and `InvalidDescriptor` leave the registry; the
/// executor turns everything else into an error result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("tool execution failed: {0}")]
    Execution(String),

    #[error("tool timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("invalid tool descriptor: {0}")]
    InvalidDescriptor(String),
}

/// Turn-fatal errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("reasoning engine unavailable: {0}")]
    ReasoningEngine(String),

    #[error("round limit exceeded ({limit} rounds)")]
    RoundLimitExceeded { limit: u32 },

    #[error("turn cancelled")]
    Cancelled,
}

impl AgentError {
    /// Text safe to show an end user
    pub fn user_message(&self) -> &'static str {
        match self {
            AgentError::ReasoningEngine(_) => {
                "The reasoning service is currently unavailable. Please try again later."
            }
            AgentError::RoundLimitExceeded { .. } => {
                "The request needed too many tool steps and was stopped."
            }
            AgentError::Cancelled => "The request was cancelled.",
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        assert_eq!(
            ToolError::UnknownTool("weather".to_string()).to_string(),
            "unknown tool: weather"
        );
        assert_eq!(
            ToolError::Timeout {
                timeout: Duration::from_secs(30)
            }
            .to_string(),
            "tool timed out after 30s"
        );
        assert_eq!(
            ToolError::Timeout {
                timeout: Duration::from_millis(1500)
            }
            .to_string(),
            "tool timed out after 1.5s"
        );
        assert_eq!(
            ToolError::Timeout {
                timeout: Duration::from_millis(50)
            }
            .to_string(),
            "tool timed out after 50ms"
        );
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = AgentError::ReasoningEngine("connection refused at 10.0.0.3".to_string());
        assert!(!err.user_message().contains("10.0.0.3"));
        assert_eq!(
            AgentError::RoundLimitExceeded { limit: 10 }.to_string(),
            "round limit exceeded (10 rounds)"
        );
    }
}
