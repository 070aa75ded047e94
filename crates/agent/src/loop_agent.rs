//! Agent loop - one reasoning turn per user message
//!
//! A turn alternates between asking the reasoning engine what to do and
//! dispatching the tool calls it proposes, until the engine answers or the
//! turn fails:
//!
//! ```text
//! Started -> Reasoning -> (ToolDispatch -> Reasoning)* -> Answered
//!                     \-> Failed
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use toolchat_config::AgentSettings;
use toolchat_provider::{
    Decision, DispatchRound, Provider, ReasoningRequest, ToolCall, ToolInvocationRequest,
    ToolResult, ToolSpec,
};

use crate::executor::ToolExecutor;
use crate::tools::ToolRegistry;
use crate::{AgentError, Result};

/// Lifecycle position of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Started,
    Reasoning,
    ToolDispatch,
    Answered,
    Failed,
}

/// Working record of one user message
#[derive(Debug, Clone)]
pub struct AgentTurn {
    user_message: String,
    rounds: Vec<DispatchRound>,
    state: TurnState,
    final_answer: Option<String>,
}

impl AgentTurn {
    fn new(user_message: &str) -> Self {
        Self {
            user_message: user_message.to_string(),
            rounds: Vec::new(),
            state: TurnState::Started,
            final_answer: None,
        }
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn rounds(&self) -> &[DispatchRound] {
        &self.rounds
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    /// All tool results of the turn, in the order they were issued
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.rounds.iter().flat_map(|round| round.results.iter())
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    pub fn into_final_answer(self) -> Option<String> {
        self.final_answer
    }

    fn used_ids(&self) -> HashSet<&str> {
        self.rounds
            .iter()
            .flat_map(|round| round.requests.iter())
            .map(|request| request.invocation_id.as_str())
            .collect()
    }
}

/// Drives turns against a reasoning engine and a tool registry
pub struct AgentLoop<P: Provider> {
    provider: Arc<P>,
    executor: ToolExecutor,
    tool_specs: Vec<ToolSpec>,
    settings: AgentSettings,
}

impl<P: Provider> AgentLoop<P> {
    pub fn new(provider: P, registry: Arc<ToolRegistry>, settings: AgentSettings) -> Self {
        let executor = ToolExecutor::new(Arc::clone(&registry))
            .with_timeout(std::time::Duration::from_secs(settings.tool_timeout_secs));
        let tool_specs = registry.specs();

        Self {
            provider: Arc::new(provider),
            executor,
            tool_specs,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.executor.registry()
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn max_rounds(&self) -> u32 {
        self.settings.max_rounds
    }

    /// Run a turn to completion and return its answer text
    pub async fn process(&self, message: &str) -> Result<String> {
        let turn = self.run_turn(message, &CancellationToken::new()).await?;
        Ok(turn.into_final_answer().unwrap_or_default())
    }

    /// Run one turn for `message`.
    ///
    /// Fails with `ReasoningEngine` on any engine fault, `RoundLimitExceeded`
    /// when the engine asks for more than `max_rounds` dispatch rounds and
    /// `Cancelled` once `cancel` fires. Tool failures never fail the turn.
    pub async fn run_turn(&self, message: &str, cancel: &CancellationToken) -> Result<AgentTurn> {
        let mut turn = AgentTurn::new(message);
        let preview: String = message.chars().take(100).collect();
        info!("Starting turn: {}", preview);

        loop {
            if cancel.is_cancelled() {
                return Err(self.fail(&mut turn, AgentError::Cancelled));
            }

            turn.state = TurnState::Reasoning;
            debug!(round = turn.round_count(), "Reasoning");

            let request = ReasoningRequest {
                system_prompt: self.system_prompt(),
                user_message: turn.user_message.clone(),
                rounds: turn.rounds.clone(),
                tools: self.tool_specs.clone(),
            };

            let decision = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(self.fail(&mut turn, AgentError::Cancelled));
                }
                decision = self.provider.decide(request) => decision,
            };

            let calls = match decision {
                Ok(Decision::FinalAnswer(text)) => {
                    turn.final_answer = Some(text);
                    turn.state = TurnState::Answered;
                    info!(rounds = turn.round_count(), "Turn answered");
                    return Ok(turn);
                }
                Ok(Decision::ToolCalls(calls)) if calls.is_empty() => {
                    let err = AgentError::ReasoningEngine(
                        "engine requested tool use without any tool calls".to_string(),
                    );
                    return Err(self.fail(&mut turn, err));
                }
                Ok(Decision::ToolCalls(calls)) => calls,
                Err(e) => {
                    return Err(self.fail(&mut turn, AgentError::ReasoningEngine(e.to_string())));
                }
            };

            if turn.round_count() >= self.settings.max_rounds as usize {
                let err = AgentError::RoundLimitExceeded {
                    limit: self.settings.max_rounds,
                };
                return Err(self.fail(&mut turn, err));
            }

            turn.state = TurnState::ToolDispatch;
            let requests = assign_invocation_ids(&turn, calls);
            debug!(
                round = turn.round_count() + 1,
                calls = requests.len(),
                "Dispatching tools"
            );

            let results = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(self.fail(&mut turn, AgentError::Cancelled));
                }
                results = self.executor.execute_round(&requests) => results,
            };

            turn.rounds.push(DispatchRound { requests, results });
        }
    }

    fn system_prompt(&self) -> Option<String> {
        let prompt = self.settings.system_prompt.trim();
        (!prompt.is_empty()).then(|| prompt.to_string())
    }

    fn fail(&self, turn: &mut AgentTurn, err: AgentError) -> AgentError {
        turn.state = TurnState::Failed;
        error!(rounds = turn.round_count(), "Turn failed: {}", err);
        err
    }
}

/// Keep engine ids that are non-empty and unused in this turn; mint the rest
fn assign_invocation_ids(turn: &AgentTurn, calls: Vec<ToolCall>) -> Vec<ToolInvocationRequest> {
    let mut used: HashSet<String> = turn.used_ids().into_iter().map(String::from).collect();

    calls
        .into_iter()
        .map(|call| {
            let id = if !call.id.is_empty() && !used.contains(&call.id) {
                call.id
            } else {
                format!("call_{}", Uuid::new_v4().simple())
            };
            used.insert(id.clone());
            ToolInvocationRequest::new(id, call.name, call.arguments)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assign_ids_keeps_unique_engine_ids() {
        let turn = AgentTurn::new("q");
        let requests = assign_invocation_ids(
            &turn,
            vec![
                ToolCall::new("a", "calculator", json!({})),
                ToolCall::new("b", "calculator", json!({})),
            ],
        );
        let ids: Vec<&str> = requests.iter().map(|r| r.invocation_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_assign_ids_replaces_empty_and_repeated_ids() {
        let mut turn = AgentTurn::new("q");
        turn.rounds.push(DispatchRound {
            requests: vec![ToolInvocationRequest::new("a", "calculator", json!({}))],
            results: vec![ToolResult::success("a", "calculator", json!(1))],
        });

        let requests = assign_invocation_ids(
            &turn,
            vec![
                ToolCall::new("a", "calculator", json!({})),
                ToolCall::new("", "calculator", json!({})),
                ToolCall::new("c", "calculator", json!({})),
                ToolCall::new("c", "calculator", json!({})),
            ],
        );

        assert_ne!(requests[0].invocation_id, "a");
        assert!(requests[1].invocation_id.starts_with("call_"));
        assert_eq!(requests[2].invocation_id, "c");
        assert_ne!(requests[3].invocation_id, "c");

        let unique: HashSet<&str> = requests.iter().map(|r| r.invocation_id.as_str()).collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_new_turn_state() {
        let turn = AgentTurn::new("hello");
        assert_eq!(turn.state(), TurnState::Started);
        assert_eq!(turn.user_message(), "hello");
        assert!(turn.final_answer().is_none());
        assert_eq!(turn.tool_results().count(), 0);
    }
}
