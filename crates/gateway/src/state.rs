use std::sync::Arc;
use toolchat_agent::AgentLoop;
use toolchat_provider::Provider;

/// Shared handler state; the agent is read-only after startup
pub struct GatewayState<P: Provider> {
    agent: Arc<AgentLoop<P>>,
}

impl<P: Provider> GatewayState<P> {
    pub fn new(agent: Arc<AgentLoop<P>>) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &AgentLoop<P> {
        &self.agent
    }
}
