//! Coworker delegation tools
//!
//! Agents that may delegate (and the manager of a hierarchical crew) get two
//! extra tools: one hands a whole piece of work to a coworker, the other
//! asks a coworker a question. Both run the coworker as a fresh task with
//! no delegation tools of its own, so delegation never recurses.

use crate::agent::CrewAgent;
use crate::executor::UsageLedger;
use crate::rpm::RpmController;
use async_trait::async_trait;
use crew_core::{Context, Error, Result};
use crew_llm::tools::schema;
use crew_prompt::PromptBuilder;
use crew_tools::Tool;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

/// The agents a delegating agent can hand work to, prepared for one run
pub struct Coworkers {
    agents: Vec<Arc<CrewAgent>>,
    roles: Vec<String>,
    inputs: Value,
    rpm: Option<RpmController>,
    ledger: UsageLedger,
    memory: Option<String>,
    crew_run_id: Option<String>,
}

impl Coworkers {
    /// Render every coworker's role with the kickoff inputs
    pub fn new(agents: Vec<Arc<CrewAgent>>, inputs: Value) -> Result<Self> {
        let roles = agents
            .iter()
            .map(|agent| agent.interpolate(&inputs).map(|persona| persona.role))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            agents,
            roles,
            inputs,
            rpm: None,
            ledger: UsageLedger::new(),
            memory: None,
            crew_run_id: None,
        })
    }

    /// Use this budget instead of each coworker's own
    pub fn with_rpm(mut self, rpm: Option<RpmController>) -> Self {
        self.rpm = rpm;
        self
    }

    /// Record coworker token usage here
    pub fn with_ledger(mut self, ledger: UsageLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Memory section shown to coworkers that have memory enabled
    pub fn with_memory(mut self, memory: Option<String>) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_crew_run_id(mut self, id: impl Into<String>) -> Self {
        self.crew_run_id = Some(id.into());
        self
    }

    /// Rendered coworker roles
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Both delegation tools over these coworkers
    pub fn into_tools(self) -> Vec<Arc<dyn Tool>> {
        let coworkers = Arc::new(self);
        vec![
            Arc::new(DelegateWorkTool::new(coworkers.clone())),
            Arc::new(AskQuestionTool::new(coworkers)),
        ]
    }

    /// Index of the coworker with this role, ignoring case and stray quotes
    fn find(&self, coworker: &str) -> Result<usize> {
        let wanted = normalize(coworker);
        self.roles
            .iter()
            .position(|role| normalize(role) == wanted)
            .ok_or_else(|| {
                Error::ProcessingFailed(format!(
                    "Coworker '{}' not found, it must be one of the following options: {}",
                    coworker,
                    self.roles.join(", ")
                ))
            })
    }

    async fn run(&self, coworker: &str, request: &str, context: &str) -> Result<String> {
        let index = self.find(coworker)?;
        let agent = &self.agents[index];
        info!(coworker = %self.roles[index], "Delegating to coworker");

        let prompt = PromptBuilder::new()
            .text(request.trim())
            .when(
                !context.trim().is_empty(),
                format!("\n\nThis is the context you're working with:\n{}", context.trim()),
            )
            .when(agent.memory(), self.memory.clone().unwrap_or_default())
            .build();

        let mut ctx = Context::new().with_inputs(self.inputs.clone());
        if let Some(id) = &self.crew_run_id {
            ctx = ctx.with_crew_run_id(id.clone());
        }
        let rpm = self.rpm.clone().unwrap_or_else(|| agent.rpm().clone());

        let outcome = agent.execute_task(prompt, &mut ctx, Vec::new(), &rpm).await?;
        self.ledger.record(outcome.usage);
        Ok(outcome.output)
    }
}

fn normalize(role: &str) -> String {
    role.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_lowercase()
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::ProcessingFailed(format!("missing required string argument '{key}'")))
}

/// Hands a whole task to a coworker and returns their final answer
pub struct DelegateWorkTool {
    coworkers: Arc<Coworkers>,
    description: String,
}

impl DelegateWorkTool {
    pub fn new(coworkers: Arc<Coworkers>) -> Self {
        let description = format!(
            "Delegate a specific task to one of the following coworkers: {}\n\
             The input to this tool should be the coworker, the task you want them to do, \
             and ALL necessary context to execute the task, they know nothing about the task, \
             so share absolute everything you know, don't reference things but instead explain them.",
            coworkers.roles().join(", ")
        );
        Self {
            coworkers,
            description,
        }
    }
}

#[async_trait]
impl Tool for DelegateWorkTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let coworker = required_str(&params, "coworker")?;
        let task = required_str(&params, "task")?;
        let context = params.get("context").and_then(Value::as_str).unwrap_or_default();
        let answer = self.coworkers.run(coworker, task, context).await?;
        Ok(Value::String(answer))
    }

    fn name(&self) -> &str {
        "delegate_work_to_coworker"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "task": schema::string("The task to delegate"),
                "context": schema::string("The context for the task"),
                "coworker": schema::string("The role/name of the coworker to delegate to"),
            }),
            &["task", "context", "coworker"],
        )
    }
}

/// Asks a coworker a question and returns their answer
pub struct AskQuestionTool {
    coworkers: Arc<Coworkers>,
    description: String,
}

impl AskQuestionTool {
    pub fn new(coworkers: Arc<Coworkers>) -> Self {
        let description = format!(
            "Ask a specific question to one of the following coworkers: {}\n\
             The input to this tool should be the coworker, the question you have for them, \
             and ALL necessary context to ask the question properly, they know nothing about \
             the question, so share absolute everything you know, don't reference things but \
             instead explain them.",
            coworkers.roles().join(", ")
        );
        Self {
            coworkers,
            description,
        }
    }
}

#[async_trait]
impl Tool for AskQuestionTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let coworker = required_str(&params, "coworker")?;
        let question = required_str(&params, "question")?;
        let context = params.get("context").and_then(Value::as_str).unwrap_or_default();
        let answer = self.coworkers.run(coworker, question, context).await?;
        Ok(Value::String(answer))
    }

    fn name(&self) -> &str {
        "ask_question_to_coworker"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "question": schema::string("The question to ask"),
                "context": schema::string("The context for the question"),
                "coworker": schema::string("The role/name of the coworker to ask"),
            }),
            &["question", "context", "coworker"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, ShoutTool, answer};

    fn agent(role: &str, provider: Arc<ScriptedProvider>) -> Arc<CrewAgent> {
        Arc::new(
            CrewAgent::builder(role)
                .goal("Help with {{ ticker }}")
                .backstory("Helpful.")
                .llm(provider)
                .tool(Arc::new(ShoutTool))
                .memory(true)
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_delegate_resolves_role_case_insensitively() {
        let provider = Arc::new(ScriptedProvider::new([answer("price is up")]));
        let ledger = UsageLedger::new();
        let tools = Coworkers::new(
            vec![agent("Senior Stock price Analyst", provider.clone())],
            json!({ "ticker": "AAPL" }),
        )
        .unwrap()
        .with_ledger(ledger.clone())
        .with_memory(Some("\n## Relevant memory\n- earlier\n".to_string()))
        .into_tools();

        let out = tools[0]
            .execute(json!({
                "coworker": "\"senior stock PRICE analyst\"",
                "task": "Get the price",
                "context": "Ticker is AAPL",
            }))
            .await
            .unwrap();
        assert_eq!(out, json!("price is up"));
        assert_eq!(ledger.total().total(), 15);

        let request = &provider.requests()[0];
        let prompt = request.messages[0].text().unwrap();
        assert!(prompt.starts_with("Get the price\n\nThis is the context you're working with:\nTicker is AAPL"));
        assert!(prompt.contains("- earlier"));
        let tool_names: Vec<_> = request.tools.as_ref().unwrap().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tool_names, vec!["shout"]);
    }

    #[tokio::test]
    async fn test_unknown_coworker_lists_options() {
        let provider = Arc::new(ScriptedProvider::default());
        let tools = Coworkers::new(
            vec![agent("Writer", provider.clone()), agent("Analyst", provider.clone())],
            json!({ "ticker": "X" }),
        )
        .unwrap()
        .into_tools();

        let err = tools[1]
            .execute(json!({ "coworker": "Chef", "question": "?", "context": "" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Writer, Analyst"));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_argument() {
        let tools = Coworkers::new(vec![], json!({})).unwrap().into_tools();
        let err = tools[0].execute(json!({ "coworker": "x" })).await.unwrap_err();
        assert!(err.to_string().contains("'task'"));
    }

    #[test]
    fn test_tool_definitions() {
        let provider = Arc::new(ScriptedProvider::default());
        let tools = Coworkers::new(vec![agent("Writer", provider)], json!({ "ticker": "X" }))
            .unwrap()
            .into_tools();

        let delegate = tools[0].definition();
        assert_eq!(delegate.name, "delegate_work_to_coworker");
        assert!(delegate.description.contains("coworkers: Writer"));
        assert_eq!(delegate.input_schema["required"], json!(["task", "context", "coworker"]));
        assert_eq!(tools[1].name(), "ask_question_to_coworker");
    }
}
