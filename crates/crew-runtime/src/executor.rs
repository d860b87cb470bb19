//! Agent executor for running agent loops
//!
//! The AgentExecutor implements the core agent loop pattern:
//! 1. Wait for the RPM budget, then call the LLM with the conversation and tools
//! 2. If tool use is requested, execute the tools and loop back
//! 3. If the model answered, return the answer
//! 4. If the iteration budget runs out, ask once more for a final answer
//!    without offering any tools

use crate::rpm::RpmController;
use crew_core::{Error, Result};
use crew_llm::{CompletionRequest, ContentBlock, LLMProvider, Message, StopReason, TokenUsage};
use crew_tools::ToolRegistry;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Prompt appended when an agent runs out of iterations
pub const FORCE_FINAL_ANSWER: &str = "Now it's time you MUST give your absolute best final answer. \
You'll ignore all previous instructions, stop using any tools, and just return your absolute BEST Final answer.";

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of tool-loop iterations before forcing an answer
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            model: "gpt-3.5-turbo".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: None,
        }
    }
}

/// Result of one executor run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// Final answer text
    pub output: String,

    /// Tokens spent across every LLM call of the run
    pub usage: TokenUsage,

    /// LLM calls made, including a forced final-answer call
    pub llm_calls: usize,
}

/// Shared token counter for a crew run
///
/// Delegated coworker runs happen inside tool calls, so their usage is
/// recorded here rather than returned through the manager's outcome.
#[derive(Debug, Clone, Default)]
pub struct UsageLedger(Arc<Mutex<TokenUsage>>);

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, usage: TokenUsage) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) += usage;
    }

    pub fn total(&self) -> TokenUsage {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Executes an agent loop: LLM → tool calls → execution → loop back
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    rpm: RpmController,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
        rpm: RpmController,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
            rpm,
        }
    }

    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute the agent loop with a user message
    pub async fn run(&self, user_message: impl Into<String>) -> Result<ExecutionOutcome> {
        let mut conversation = vec![Message::user(user_message)];
        let mut usage = TokenUsage::default();
        let mut llm_calls = 0;

        for iteration in 1..=self.config.max_iterations {
            info!(
                iteration = iteration,
                max_iterations = self.config.max_iterations,
                "Agent iteration started"
            );

            let tools = self.tool_registry.definitions();
            let response = self.complete(&conversation, tools).await?;
            llm_calls += 1;
            usage += response.usage;

            let response_preview: String =
                response.message.text().unwrap_or("").chars().take(300).collect();
            debug!(response_preview = %response_preview, "LLM response content preview");

            conversation.push(response.message.clone());

            match response.stop_reason {
                StopReason::ToolUse if response.message.has_tool_uses() => {
                    let tool_results = self.execute_tools(&response.message).await;
                    info!(
                        result_count = tool_results.len(),
                        "Tool execution completed, continuing agent loop"
                    );
                    conversation.extend(tool_results);
                }
                StopReason::MaxTokens => {
                    warn!("Hit max tokens in LLM response");
                    return Ok(Self::finish(&response.message, usage, llm_calls));
                }
                _ => {
                    let outcome = Self::finish(&response.message, usage, llm_calls);
                    info!(
                        iteration = iteration,
                        response_length = outcome.output.len(),
                        "Agent completed naturally"
                    );
                    return Ok(outcome);
                }
            }
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Max iterations reached, forcing a final answer"
        );
        conversation.push(Message::user(FORCE_FINAL_ANSWER));
        let response = self.complete(&conversation, Vec::new()).await?;
        usage += response.usage;
        Ok(Self::finish(&response.message, usage, llm_calls + 1))
    }

    fn finish(message: &Message, usage: TokenUsage, llm_calls: usize) -> ExecutionOutcome {
        ExecutionOutcome {
            output: message.text().unwrap_or_default().trim().to_string(),
            usage,
            llm_calls,
        }
    }

    async fn complete(
        &self,
        conversation: &[Message],
        tools: Vec<crew_llm::ToolDefinition>,
    ) -> Result<crew_llm::CompletionResponse> {
        self.rpm.acquire().await;

        info!(
            model = %self.config.model,
            max_tokens = self.config.max_tokens,
            temperature = ?self.config.temperature,
            tool_count = tools.len(),
            "Sending request to LLM"
        );

        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(conversation.to_vec())
            .max_tokens(self.config.max_tokens)
            .tools(tools);
        if let Some(system) = &self.config.system_prompt {
            builder = builder.system(system.clone());
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }

        let response = self
            .provider
            .complete(builder.build())
            .await
            .map_err(|e| Error::ProcessingFailed(e.to_string()))?;

        info!(
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM response received"
        );
        Ok(response)
    }

    /// Execute tool calls from an assistant message
    ///
    /// Failures, including unknown tool names, go back to the model as error
    /// results so it can correct itself.
    async fn execute_tools(&self, message: &Message) -> Vec<Message> {
        let mut results = Vec::new();

        for tool_use in message.tool_uses() {
            let ContentBlock::ToolUse { id, name, input } = tool_use else {
                continue;
            };

            let input_preview: String = input.to_string().chars().take(500).collect();
            info!(
                tool_name = %name,
                tool_id = %id,
                input_preview = %input_preview,
                "Executing tool"
            );

            let Some(tool) = self.tool_registry.get(name) else {
                warn!(tool_name = %name, "Unknown tool requested");
                results.push(Message::tool_error(
                    id.clone(),
                    format!(
                        "Error: tool '{}' does not exist. Available tools: {}",
                        name,
                        self.tool_registry.names().join(", ")
                    ),
                ));
                continue;
            };

            let start_time = std::time::Instant::now();
            match tool.execute(input.clone()).await {
                Ok(result) => {
                    let duration_ms = start_time.elapsed().as_millis() as u64;
                    let result_str = match result {
                        serde_json::Value::String(text) => text,
                        other => other.to_string(),
                    };
                    info!(
                        tool_name = %name,
                        duration_ms = duration_ms,
                        result_length = result_str.len(),
                        "Tool execution succeeded"
                    );
                    results.push(Message::tool_result(id.clone(), result_str));
                }
                Err(e) => {
                    let duration_ms = start_time.elapsed().as_millis() as u64;
                    warn!(
                        tool_name = %name,
                        duration_ms = duration_ms,
                        error = %e,
                        "Tool execution failed"
                    );
                    results.push(Message::tool_error(id.clone(), format!("Error: {e}")));
                }
            }
        }

        results
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    rpm: RpmController,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
            rpm: RpmController::unlimited(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Share an RPM budget with other executors
    pub fn rpm(mut self, rpm: RpmController) -> Self {
        self.rpm = rpm;
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;

        Ok(AgentExecutor::new(
            provider,
            self.tool_registry,
            self.config,
            self.rpm,
        ))
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, ShoutTool, answer, tool_call, tool_results};
    use serde_json::json;

    fn executor(provider: Arc<ScriptedProvider>, max_iterations: usize) -> AgentExecutor {
        let registry = ToolRegistry::from_tools([Arc::new(ShoutTool) as Arc<dyn crew_tools::Tool>]);
        AgentExecutor::builder()
            .provider(provider)
            .tool_registry(Arc::new(registry))
            .model("test-model")
            .system_prompt("You are a tester.")
            .max_iterations(max_iterations)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_provider() {
        let result = AgentExecutorBuilder::new().model("m").build();
        assert!(matches!(result, Err(Error::InitializationFailed(_))));
    }

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_iterations, 15);
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert!(config.temperature.is_none());
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let provider = Arc::new(ScriptedProvider::new([answer("  done  ")]));
        let outcome = executor(provider.clone(), 3).run("hi").await.unwrap();

        assert_eq!(outcome.output, "done");
        assert_eq!(outcome.llm_calls, 1);
        assert_eq!(outcome.usage.total(), 15);

        let request = &provider.requests()[0];
        assert_eq!(request.model, "test-model");
        assert_eq!(request.system.as_deref(), Some("You are a tester."));
        assert_eq!(request.tools.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_tool_loop_feeds_results_back() {
        let provider = Arc::new(ScriptedProvider::new([
            tool_call("call_1", "shout", json!({ "text": "up" })),
            answer("The trend is UP"),
        ]));
        let outcome = executor(provider.clone(), 3).run("trend?").await.unwrap();

        assert_eq!(outcome.output, "The trend is UP");
        assert_eq!(outcome.llm_calls, 2);
        let second = &provider.requests()[1];
        assert_eq!(tool_results(second), vec![("UP".to_string(), false)]);
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_to_model() {
        let provider = Arc::new(ScriptedProvider::new([
            tool_call("call_1", "whisper", json!({})),
            answer("ok"),
        ]));
        executor(provider.clone(), 3).run("go").await.unwrap();

        let results = tool_results(&provider.requests()[1]);
        assert_eq!(results.len(), 1);
        assert!(results[0].1);
        assert!(results[0].0.contains("whisper"));
        assert!(results[0].0.contains("shout"));
    }

    #[tokio::test]
    async fn test_max_iterations_forces_final_answer() {
        let provider = Arc::new(ScriptedProvider::new([
            tool_call("call_1", "shout", json!({ "text": "a" })),
            tool_call("call_2", "shout", json!({ "text": "b" })),
            answer("best final answer"),
        ]));
        let outcome = executor(provider.clone(), 2).run("loop").await.unwrap();

        assert_eq!(outcome.output, "best final answer");
        assert_eq!(outcome.llm_calls, 3);

        let requests = provider.requests();
        let last = requests.last().unwrap();
        assert!(last.tools.is_none());
        assert_eq!(
            last.messages.last().and_then(Message::text),
            Some(FORCE_FINAL_ANSWER)
        );
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(ScriptedProvider::default());
        let err = executor(provider, 3).run("hi").await.unwrap_err();
        assert!(matches!(err, Error::ProcessingFailed(_)));
    }

    #[test]
    fn test_usage_ledger_accumulates_across_clones() {
        let ledger = UsageLedger::new();
        let shared = ledger.clone();
        ledger.record(crate::testing::usage());
        shared.record(crate::testing::usage());
        assert_eq!(ledger.total().input_tokens, 20);
        assert_eq!(ledger.total().output_tokens, 10);
    }
}
