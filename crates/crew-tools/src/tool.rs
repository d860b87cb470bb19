//! Tool trait definition

use async_trait::async_trait;
use crew_core::Result;
use crew_llm::ToolDefinition;
use serde_json::Value;

/// Trait for tools that agents can execute
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with parameters matching [`Tool::input_schema`]
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Tool name, unique within a registry
    ///
    /// Providers restrict function names to `[a-zA-Z0-9_-]`, so use
    /// snake_case here and keep the human-facing name in the description.
    fn name(&self) -> &str;

    /// Description that tells the LLM when to use this tool
    fn description(&self) -> &str;

    /// JSON Schema of the tool input
    fn input_schema(&self) -> Value;

    /// Definition sent to the LLM provider
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}
