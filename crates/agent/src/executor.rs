//! Tool executor
//!
//! Resolves, validates and runs tool invocations. Every request yields
//! exactly one [`ToolResult`]; lookup failures, invalid input, handler
//! errors, panics and timeouts all come back as error results.

use serde_json::{Map, Value};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use toolchat_provider::{ToolInvocationRequest, ToolResult};

use crate::tools::ToolRegistry;
use crate::ToolError;

/// Default per-invocation time budget
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs tool invocations against a shared, read-only registry
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute one invocation
    pub async fn execute(&self, request: &ToolInvocationRequest) -> ToolResult {
        debug!(
            tool = %request.tool_name,
            invocation = %request.invocation_id,
            "Executing tool"
        );

        match self.try_execute(request).await {
            Ok(value) => ToolResult::success(&request.invocation_id, &request.tool_name, value),
            Err(e) => {
                warn!(
                    tool = %request.tool_name,
                    invocation = %request.invocation_id,
                    "Tool invocation failed: {}",
                    e
                );
                ToolResult::error(&request.invocation_id, &request.tool_name, e.to_string())
            }
        }
    }

    /// Execute a round of invocations concurrently.
    ///
    /// Returns once every invocation has finished; results keep request order.
    pub async fn execute_round(&self, requests: &[ToolInvocationRequest]) -> Vec<ToolResult> {
        let pending = requests.iter().map(|request| self.execute(request));
        futures::future::join_all(pending).await
    }

    async fn try_execute(&self, request: &ToolInvocationRequest) -> Result<Value, ToolError> {
        let descriptor = self.registry.lookup(&request.tool_name)?;
        let args: Map<String, Value> = descriptor.schema().validate(&request.input)?;

        let handler = descriptor.handler();
        let mut task =
            tokio::spawn(async move { handler.call(&args).await.map_err(|e| e.to_string()) });

        match timeout(self.timeout, &mut task).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(message))) => Err(ToolError::Execution(message)),
            Ok(Err(join_err)) if join_err.is_panic() => Err(ToolError::Execution(format!(
                "handler panicked: {}",
                panic_message(join_err.into_panic())
            ))),
            Ok(Err(join_err)) => Err(ToolError::Execution(join_err.to_string())),
            Err(_) => {
                task.abort();
                Err(ToolError::Timeout {
                    timeout: self.timeout,
                })
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
