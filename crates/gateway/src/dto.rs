use serde::{Deserialize, Serialize};
use toolchat_provider::ToolSpec;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
    pub status: String,
}

impl ChatResponse {
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            status: "success".to_string(),
        }
    }

    pub fn error(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            status: "error".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolSpec>,
}
