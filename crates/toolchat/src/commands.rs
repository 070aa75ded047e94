//! toolchat command implementations

use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use toolchat_agent::{default_registry, AgentLoop, ToolExecutor, ToolRegistry};
use toolchat_config::{self, Config};
use toolchat_provider::{OpenAiProvider, ToolInvocationRequest};

fn registry() -> Result<Arc<ToolRegistry>> {
    let registry = default_registry().context("Failed to register built-in tools")?;
    Ok(Arc::new(registry))
}

async fn load_config() -> Result<Config> {
    Config::load().await.context("Failed to load configuration")
}

fn build_agent(config: &Config) -> Result<AgentLoop<OpenAiProvider>> {
    if !config.has_api_key() {
        anyhow::bail!(
            "No API key configured. Set TOOLCHAT_API_KEY or add one to {}",
            toolchat_config::config_path().display()
        );
    }

    let provider = OpenAiProvider::from_config(&config.engine);
    Ok(AgentLoop::new(provider, registry()?, config.agent.clone()))
}

/// Write a default config file if none exists
pub async fn init_command() -> Result<()> {
    let path = toolchat_config::config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    Config::default()
        .save_to(&path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created {}", path.display());
    println!("\nNext steps:");
    println!("  1. Add your API key to the config or set TOOLCHAT_API_KEY");
    println!("  2. Ask something: toolchat ask -m \"How many r's in strawberry?\"");
    Ok(())
}

/// Start the HTTP chat gateway
pub async fn serve_command() -> Result<()> {
    let config = load_config().await?;
    let agent = Arc::new(build_agent(&config)?);

    info!(
        model = %config.engine.model,
        tools = agent.registry().len(),
        max_rounds = agent.max_rounds(),
        "Starting chat gateway"
    );
    println!("Chat gateway listening on http://{}", config.bind_address());
    println!("Press Ctrl+C to stop");

    toolchat_gateway::serve(agent, &config.gateway)
        .await
        .context("Chat gateway failed")?;
    Ok(())
}

/// Run one agent turn and print the answer
pub async fn ask_command(message: String) -> Result<()> {
    let config = load_config().await?;
    let agent = build_agent(&config)?;

    let answer = agent
        .process(&message)
        .await
        .context("Agent turn failed")?;
    println!("{}", answer);
    Ok(())
}

/// List registered tools
pub fn tools_command() -> Result<()> {
    let registry = registry()?;
    for descriptor in registry.names() {
        let descriptor = registry.lookup(&descriptor)?;
        let params: Vec<String> = descriptor
            .schema()
            .params()
            .iter()
            .map(|p| {
                let marker = if p.required { "" } else { "?" };
                format!("{}{}: {}", p.name, marker, p.param_type.json_type())
            })
            .collect();
        println!(
            "{} ({})\n    {}",
            descriptor.name(),
            params.join(", "),
            descriptor.description()
        );
    }
    Ok(())
}

/// Run one tool through the executor and print the result envelope
pub async fn call_command(tool: String, input: String) -> Result<()> {
    let config = load_config().await?;
    let input: Value = serde_json::from_str(&input).context("--input must be valid JSON")?;

    let executor = ToolExecutor::new(registry()?)
        .with_timeout(Duration::from_secs(config.agent.tool_timeout_secs));
    let request =
        ToolInvocationRequest::new(format!("cli_{}", Uuid::new_v4().simple()), tool, input);

    let result = executor.execute(&request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Show configuration status without revealing secrets
pub async fn status_command() -> Result<()> {
    let config_path = toolchat_config::config_path();
    let config = load_config().await?;

    println!("toolchat status");
    println!("---------------");
    println!(
        "Config:      {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing, using defaults]"
        }
    );
    println!("Model:       {}", config.engine.model);
    println!(
        "API base:    {}",
        config.engine.api_base.as_deref().unwrap_or("(provider default)")
    );
    println!(
        "API key:     {}",
        if config.has_api_key() { "[Set]" } else { "[Missing]" }
    );
    println!("Max rounds:  {}", config.agent.max_rounds);
    println!("Tool timeout: {}s", config.agent.tool_timeout_secs);
    println!("Gateway:     {}", config.bind_address());
    println!("CORS:        {}", config.gateway.allowed_origins.join(", "));

    Ok(())
}
