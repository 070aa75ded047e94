//! OpenAI-compatible chat-completions engine
//!
//! Works with any endpoint speaking the `/chat/completions` protocol with
//! function tools (OpenAI, OpenRouter, vLLM, Ollama).

use crate::*;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// OpenAI-compatible reasoning engine
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, api_base: Option<String>, model: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let api_base = api_base
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| {
                if api_key.starts_with("sk-or-") {
                    OPENROUTER_API_BASE.to_string()
                } else {
                    OPENAI_API_BASE.to_string()
                }
            });

        Self {
            client: Client::new(),
            api_key,
            api_base,
            model: model.into(),
            max_tokens: 4096,
            temperature: 0.2,
        }
    }

    /// Build from the engine section of the configuration
    pub fn from_config(config: &toolchat_config::EngineConfig) -> Self {
        Self::new(config.api_key.clone(), config.api_base.clone(), config.model.clone())
            .with_sampling(config.max_tokens, config.temperature)
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn build_request(&self, request: &ReasoningRequest) -> Value {
        let mut messages = Vec::new();

        if let Some(prompt) = &request.system_prompt {
            messages.push(json!({ "role": "system", "content": prompt }));
        }
        messages.push(json!({ "role": "user", "content": &request.user_message }));

        for round in &request.rounds {
            let tool_calls: Vec<Value> = round
                .requests
                .iter()
                .map(|req| {
                    json!({
                        "id": &req.invocation_id,
                        "type": "function",
                        "function": {
                            "name": &req.tool_name,
                            "arguments": req.input.to_string()
                        }
                    })
                })
                .collect();
            messages.push(json!({
                "role": "assistant",
                "content": Value::Null,
                "tool_calls": tool_calls
            }));

            for result in &round.results {
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": &result.invocation_id,
                    "name": &result.tool_name,
                    "content": result.content()
                }));
            }
        }

        let mut body = json!({
            "model": &self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": &t.name,
                            "description": &t.description,
                            "parameters": &t.parameters
                        }
                    })
                })
                .collect();

            body["tools"] = json!(tools);
            body["tool_choice"] = json!("auto");
        }

        body
    }

    fn parse_response(&self, json: Value) -> Result<Decision> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let message = &choice["message"];

        if let Some(calls) = message["tool_calls"].as_array() {
            if !calls.is_empty() {
                let mut tool_calls = Vec::with_capacity(calls.len());
                for call in calls {
                    let function = &call["function"];
                    let name = function["name"]
                        .as_str()
                        .ok_or(ProviderError::InvalidResponse)?;
                    // Arguments arrive as a JSON-encoded string; anything
                    // unparseable is passed through for the executor to reject.
                    let arguments = match &function["arguments"] {
                        Value::String(raw) if raw.trim().is_empty() => json!({}),
                        Value::String(raw) => {
                            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
                        }
                        Value::Null => json!({}),
                        other => other.clone(),
                    };

                    tool_calls.push(ToolCall {
                        id: call["id"].as_str().unwrap_or("").to_string(),
                        name: name.to_string(),
                        arguments,
                    });
                }
                return Ok(Decision::ToolCalls(tool_calls));
            }
        }

        match message["content"].as_str() {
            Some(content) => Ok(Decision::FinalAnswer(content.to_string())),
            None => Err(ProviderError::InvalidResponse),
        }
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    async fn decide(&self, request: ReasoningRequest) -> Result<Decision> {
        if !self.is_configured() {
            return Err(ProviderError::NoApiKey);
        }

        trace!("Calling reasoning engine at {}", self.api_base);

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(&request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }

        let json: Value = response.json().await?;

        if !status.is_success() {
            let error = json["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(ProviderError::Api(error));
        }

        debug!(
            tool_calls = json["choices"][0]["message"]["tool_calls"]
                .as_array()
                .map(|v| v.len())
                .unwrap_or(0),
            "Reasoning engine responded"
        );

        self.parse_response(json)
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
