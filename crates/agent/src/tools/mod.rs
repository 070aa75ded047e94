//! Tool registry and built-in tools

pub mod calculator;
pub mod current_time;
pub mod letter_counter;
pub mod schema;

pub use calculator::CalculatorTool;
pub use current_time::CurrentTimeTool;
pub use letter_counter::LetterCounterTool;
pub use schema::{ParamSpec, ParamType, ToolSchema};

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use toolchat_provider::ToolSpec;

use crate::ToolError;

/// Handler outcome: a structured value or a failure message
pub type HandlerResult = Result<Value, Box<dyn std::error::Error + Send + Sync>>;

/// A callable tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> ToolSchema;
    /// Runs with input already validated against [`ToolHandler::schema`]
    async fn call(&self, input: &Map<String, Value>) -> HandlerResult;
}

/// Immutable registry entry
pub struct ToolDescriptor {
    name: String,
    description: String,
    schema: ToolSchema,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    /// Captures the handler's name, description and schema once
    pub fn new<T: ToolHandler + 'static>(handler: T) -> Self {
        Self {
            name: handler.name().to_string(),
            description: handler.description().to_string(),
            schema: handler.schema(),
            handler: Arc::new(handler),
        }
    }

    /// Builds a descriptor around an async closure
    pub fn from_fn<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ToolSchema,
        f: F,
    ) -> Self
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::new(FnTool {
            name: name.into(),
            description: description.into(),
            schema,
            f,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    pub(crate) fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }

    pub fn spec(&self) -> ToolSpec {
        ToolSpec::new(&self.name, &self.description, self.schema.to_json_schema())
    }

    fn check(&self) -> Result<(), ToolError> {
        if self.name.trim().is_empty() {
            return Err(ToolError::InvalidDescriptor(
                "tool name cannot be empty".to_string(),
            ));
        }
        self.schema.check()
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

struct FnTool<F> {
    name: String,
    description: String,
    schema: ToolSchema,
    f: F,
}

#[async_trait]
impl<F, Fut> ToolHandler for FnTool<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }

    async fn call(&self, input: &Map<String, Value>) -> HandlerResult {
        (self.f)(input.clone()).await
    }
}

/// Named tools, filled once at startup and read-only afterwards
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<ToolDescriptor>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), ToolError> {
        descriptor.check()?;
        if self.index.contains_key(descriptor.name()) {
            return Err(ToolError::DuplicateTool(descriptor.name().to_string()));
        }

        debug!(tool = descriptor.name(), "Registering tool");
        self.index
            .insert(descriptor.name().to_string(), self.tools.len());
        self.tools.push(Arc::new(descriptor));
        Ok(())
    }

    pub fn register_tool<T: ToolHandler + 'static>(&mut self, tool: T) -> Result<(), ToolError> {
        self.register(ToolDescriptor::new(tool))
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<ToolDescriptor>, ToolError> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.tools[i]))
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Engine-facing descriptions in registration order
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }
}

/// Register the built-in tools
pub fn register_default_tools(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry.register_tool(LetterCounterTool)?;
    registry.register_tool(CalculatorTool)?;
    registry.register_tool(CurrentTimeTool::default())?;
    Ok(())
}

/// Registry pre-filled with the built-in tools
pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    register_default_tools(&mut registry)?;
    Ok(registry)
}
