//! Test doubles shared by the runtime's unit tests

use async_trait::async_trait;
use crew_core::Result;
use crew_llm::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, StopReason, TokenUsage,
};
use crew_tools::Tool;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;

/// LLM provider that replays canned responses and records every request
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: impl IntoIterator<Item = CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> crew_llm::Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::UnexpectedResponse("script exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn usage() -> TokenUsage {
    TokenUsage {
        input_tokens: 10,
        output_tokens: 5,
    }
}

/// A final text answer
pub fn answer(text: &str) -> CompletionResponse {
    CompletionResponse {
        message: Message::assistant(text),
        stop_reason: StopReason::EndTurn,
        usage: usage(),
    }
}

/// A single tool call
pub fn tool_call(id: &str, name: &str, input: Value) -> CompletionResponse {
    CompletionResponse {
        message: Message::tool_use(id, name, input),
        stop_reason: StopReason::ToolUse,
        usage: usage(),
    }
}

/// Tool that upper-cases its `text` argument
pub struct ShoutTool;

#[async_trait]
impl Tool for ShoutTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let text = params["text"].as_str().unwrap_or_default();
        Ok(json!(text.to_uppercase()))
    }

    fn name(&self) -> &str {
        "shout"
    }

    fn description(&self) -> &str {
        "Upper-cases text"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "text": { "type": "string" } } })
    }
}

/// Text of every tool result block in a request, in order
pub fn tool_results(request: &CompletionRequest) -> Vec<(String, bool)> {
    request
        .messages
        .iter()
        .filter_map(|m| match &m.content {
            Some(crew_llm::MessageContent::Blocks(blocks)) => Some(blocks),
            _ => None,
        })
        .flatten()
        .filter_map(|b| match b {
            crew_llm::ContentBlock::ToolResult {
                content, is_error, ..
            } => Some((content.clone(), is_error.unwrap_or(false))),
            _ => None,
        })
        .collect()
}
