//! Role-playing crew agent

use crate::executor::{AgentExecutor, ExecutionOutcome};
use crate::rpm::RpmController;
use async_trait::async_trait;
use crew_core::{Agent, Context, Error, Result};
use crew_llm::LLMProvider;
use crew_prompt::PromptTemplate;
use crew_tools::{Tool, ToolRegistry};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// An agent defined by a role, a goal and a backstory
///
/// All three are templates, so an agent can be defined once and pointed at
/// a different ticker (or any other input) per kickoff.
pub struct CrewAgent {
    role: PromptTemplate,
    goal: PromptTemplate,
    backstory: PromptTemplate,
    llm: Arc<dyn LLMProvider>,
    model: String,
    tools: Vec<Arc<dyn Tool>>,
    max_iter: usize,
    max_tokens: usize,
    temperature: Option<f32>,
    rpm: RpmController,
    memory: bool,
    allow_delegation: bool,
    verbose: bool,
}

/// An agent's role, goal and backstory rendered for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl Persona {
    /// System prompt for the agent's LLM calls
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }
}

impl CrewAgent {
    pub fn builder(role: impl Into<String>) -> CrewAgentBuilder {
        CrewAgentBuilder::new(role)
    }

    /// Role as written, before interpolation
    pub fn role(&self) -> &str {
        self.role.source()
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn rpm(&self) -> &RpmController {
        &self.rpm
    }

    pub fn memory(&self) -> bool {
        self.memory
    }

    pub fn allow_delegation(&self) -> bool {
        self.allow_delegation
    }

    /// Render role, goal and backstory with the kickoff inputs
    pub fn interpolate(&self, vars: &Value) -> Result<Persona> {
        Ok(Persona {
            role: self.role.render(vars)?,
            goal: self.goal.render(vars)?,
            backstory: self.backstory.render(vars)?,
        })
    }

    /// Run one task prompt to a final answer
    ///
    /// The agent's own tools are offered together with `extra_tools`
    /// (delegation tools, for instance). Every LLM call waits on `rpm`.
    pub async fn execute_task(
        &self,
        task_prompt: String,
        context: &mut Context,
        extra_tools: Vec<Arc<dyn Tool>>,
        rpm: &RpmController,
    ) -> Result<ExecutionOutcome> {
        let vars = context.inputs().cloned().unwrap_or_else(|| Value::Object(Default::default()));
        let persona = self.interpolate(&vars)?;
        context.set_agent_role(persona.role.clone());

        let registry = ToolRegistry::from_tools(self.tools.iter().cloned().chain(extra_tools));
        if self.verbose {
            info!(
                agent = %persona.role,
                task_id = ?context.task_id(),
                tools = ?registry.names(),
                "Agent started task"
            );
        } else {
            debug!(agent = %persona.role, tools = ?registry.names(), "Agent started task");
        }

        let executor = AgentExecutor::builder()
            .provider(self.llm.clone())
            .tool_registry(Arc::new(registry))
            .model(&self.model)
            .system_prompt(persona.system_prompt())
            .max_iterations(self.max_iter)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .rpm(rpm.clone())
            .build()?;

        let outcome = executor.run(task_prompt).await?;

        if self.verbose {
            info!(
                agent = %persona.role,
                llm_calls = outcome.llm_calls,
                output = %outcome.output,
                "Agent finished task"
            );
        } else {
            debug!(agent = %persona.role, llm_calls = outcome.llm_calls, "Agent finished task");
        }
        Ok(outcome)
    }
}

#[async_trait]
impl Agent for CrewAgent {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        let rpm = self.rpm.clone();
        let outcome = self.execute_task(input, context, Vec::new(), &rpm).await?;
        Ok(outcome.output)
    }

    fn name(&self) -> &str {
        self.role()
    }
}

impl std::fmt::Debug for CrewAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrewAgent")
            .field("role", &self.role.source())
            .field("model", &self.model)
            .field("llm", &self.llm.name())
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("max_iter", &self.max_iter)
            .field("max_rpm", &self.rpm.max_rpm())
            .field("memory", &self.memory)
            .field("allow_delegation", &self.allow_delegation)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CrewAgent`]
pub struct CrewAgentBuilder {
    role: String,
    goal: String,
    backstory: String,
    llm: Option<Arc<dyn LLMProvider>>,
    model: String,
    tools: Vec<Arc<dyn Tool>>,
    max_iter: usize,
    max_tokens: usize,
    temperature: Option<f32>,
    max_rpm: Option<u32>,
    memory: bool,
    allow_delegation: bool,
    verbose: bool,
}

impl CrewAgentBuilder {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: String::new(),
            backstory: String::new(),
            llm: None,
            model: "gpt-3.5-turbo".to_string(),
            tools: Vec::new(),
            max_iter: 15,
            max_tokens: 4096,
            temperature: None,
            max_rpm: None,
            memory: false,
            allow_delegation: false,
            verbose: false,
        }
    }

    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    pub fn llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_rpm(mut self, max_rpm: u32) -> Self {
        self.max_rpm = Some(max_rpm);
        self
    }

    pub fn memory(mut self, memory: bool) -> Self {
        self.memory = memory;
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Result<CrewAgent> {
        let llm = self.llm.ok_or_else(|| {
            Error::InitializationFailed(format!("agent '{}' has no LLM", self.role))
        })?;
        if self.max_iter == 0 {
            return Err(Error::InitializationFailed(format!(
                "agent '{}' needs max_iter of at least 1",
                self.role
            )));
        }

        Ok(CrewAgent {
            goal: PromptTemplate::new(format!("{}.goal", self.role), self.goal)?,
            backstory: PromptTemplate::new(format!("{}.backstory", self.role), self.backstory)?,
            role: PromptTemplate::new("role", self.role)?,
            llm,
            model: self.model,
            tools: self.tools,
            max_iter: self.max_iter,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            rpm: RpmController::new(self.max_rpm),
            memory: self.memory,
            allow_delegation: self.allow_delegation,
            verbose: self.verbose,
        })
    }
}
