//! Crew: agents, tasks and the process that runs them

use crate::agent::CrewAgent;
use crate::delegation::Coworkers;
use crate::executor::UsageLedger;
use crate::inputs::KickoffInputs;
use crate::memory::ShortTermMemory;
use crate::process::Process;
use crate::rpm::RpmController;
use crate::task::{Task, TaskOutput};
use async_trait::async_trait;
use crew_core::{Context, Error, Result};
use crew_llm::{LLMProvider, TokenUsage};
use crew_tools::Tool;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Role of the manager agent in a hierarchical crew
pub const MANAGER_ROLE: &str = "Crew Manager";

const MANAGER_GOAL: &str = "Manage the team to complete the task in the best way possible.";

const MANAGER_BACKSTORY: &str = "You are a seasoned manager with a knack for getting the best out of your team.
You are also known for your ability to delegate work to the right people, and to ask the right questions to get the best out of your team.
Even though you don't perform tasks by yourself, you have a lot of experience in the field, which allows you to properly evaluate the work of your team members.";

/// Result of a crew run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Raw output of the last task
    pub final_output: String,

    /// Every task's output, filled only when the crew runs with `full_output`
    pub tasks_outputs: Vec<TaskOutput>,

    /// Tokens spent by every agent in the run, delegated work included
    pub token_usage: TokenUsage,
}

/// Anything that can run a crew for a set of inputs
///
/// Front ends depend on this rather than on [`Crew`] so they can be tested
/// without an LLM.
#[async_trait]
pub trait Kickoff: Send + Sync {
    async fn kickoff(&self, inputs: KickoffInputs) -> Result<CrewOutput>;
}

/// A team of agents working through an ordered list of tasks
#[derive(Debug)]
pub struct Crew {
    agents: Vec<Arc<CrewAgent>>,
    tasks: Vec<Task>,
    process: Process,
    manager: Option<Arc<CrewAgent>>,
    max_rpm: Option<u32>,
    full_output: bool,
    verbose: bool,
}

impl Crew {
    pub fn builder() -> CrewBuilder {
        CrewBuilder::new()
    }

    pub fn agents(&self) -> &[Arc<CrewAgent>] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn process(&self) -> Process {
        self.process
    }

    pub fn max_rpm(&self) -> Option<u32> {
        self.max_rpm
    }

    pub fn full_output(&self) -> bool {
        self.full_output
    }

    /// Manager agent of a hierarchical crew
    pub fn manager(&self) -> Option<&Arc<CrewAgent>> {
        self.manager.as_ref()
    }

    /// Run every task in order and return the last task's output
    pub async fn run(&self, inputs: &KickoffInputs) -> Result<CrewOutput> {
        let run_id = Uuid::new_v4().to_string();
        let vars = inputs.to_value();
        let crew_rpm = self.max_rpm.map(|rpm| RpmController::new(Some(rpm)));
        let ledger = UsageLedger::new();
        let mut memory = ShortTermMemory::new();
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        info!(
            crew_run_id = %run_id,
            process = %self.process,
            agent_count = self.agents.len(),
            task_count = self.tasks.len(),
            "Crew kickoff"
        );

        for (index, task) in self.tasks.iter().enumerate() {
            let context_outputs: Vec<&TaskOutput> = match task.context() {
                Some(indices) => indices.iter().filter_map(|&i| outputs.get(i)).collect(),
                None => outputs.last().into_iter().collect(),
            };
            let mut prompt = task.prompt(&vars, &context_outputs)?;
            let assigned = task.agent().and_then(|role| self.find_agent(role));

            let (agent, candidates, use_memory) = match self.process {
                Process::Sequential => {
                    let i = assigned.ok_or_else(|| {
                        Error::InitializationFailed(format!("task {index} has no agent"))
                    })?;
                    let agent = &self.agents[i];
                    let coworkers: Vec<Arc<CrewAgent>> = if agent.allow_delegation() {
                        self.agents
                            .iter()
                            .enumerate()
                            .filter(|&(j, _)| j != i)
                            .map(|(_, a)| a.clone())
                            .collect()
                    } else {
                        Vec::new()
                    };
                    (agent, coworkers, agent.memory())
                }
                Process::Hierarchical => {
                    let manager = self.manager.as_ref().ok_or_else(|| {
                        Error::InitializationFailed(
                            "hierarchical crew requires a manager LLM".to_string(),
                        )
                    })?;
                    if let Some(i) = assigned {
                        let persona = self.agents[i].interpolate(&vars)?;
                        prompt.push_str(&format!(
                            "\n\nThe preferred coworker for this task is: {}",
                            persona.role
                        ));
                    }
                    let use_memory = assigned.is_some_and(|i| self.agents[i].memory());
                    (manager, self.agents.clone(), use_memory)
                }
            };

            let rendered_memory = memory.render();
            if use_memory {
                if let Some(section) = &rendered_memory {
                    prompt.push_str(section);
                }
            }

            let extra_tools =
                self.delegation_tools(candidates, &vars, &run_id, crew_rpm.clone(), &ledger, rendered_memory)?;

            let task_id = task
                .name()
                .map_or_else(|| format!("task-{index}"), ToString::to_string);
            let mut ctx = Context::new()
                .with_crew_run_id(run_id.clone())
                .with_task_id(task_id.clone())
                .with_inputs(vars.clone());
            let rpm = crew_rpm.clone().unwrap_or_else(|| agent.rpm().clone());

            info!(crew_run_id = %run_id, task_id = %task_id, agent = %agent.role(), "Task started");
            let outcome = agent.execute_task(prompt, &mut ctx, extra_tools, &rpm).await?;
            ledger.record(outcome.usage);

            let description = task.interpolate_description(&vars)?;
            let producer = ctx.agent_role().unwrap_or(agent.role()).to_string();
            if self.verbose {
                info!(task_id = %task_id, agent = %producer, output = %outcome.output, "Task completed");
            } else {
                debug!(task_id = %task_id, agent = %producer, "Task completed");
            }

            memory.record(producer.clone(), description.clone(), outcome.output.clone());
            outputs.push(TaskOutput {
                description,
                raw: outcome.output,
                agent: producer,
            });
        }

        let token_usage = ledger.total();
        info!(
            crew_run_id = %run_id,
            total_tokens = token_usage.total(),
            "Crew finished"
        );

        Ok(CrewOutput {
            final_output: outputs.last().map(|o| o.raw.clone()).unwrap_or_default(),
            tasks_outputs: if self.full_output { outputs } else { Vec::new() },
            token_usage,
        })
    }

    fn find_agent(&self, role: &str) -> Option<usize> {
        let role = role.trim();
        self.agents
            .iter()
            .position(|agent| agent.role().trim().eq_ignore_ascii_case(role))
    }

    fn delegation_tools(
        &self,
        candidates: Vec<Arc<CrewAgent>>,
        vars: &Value,
        run_id: &str,
        rpm: Option<RpmController>,
        ledger: &UsageLedger,
        memory: Option<String>,
    ) -> Result<Vec<Arc<dyn Tool>>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Coworkers::new(candidates, vars.clone())?
            .with_rpm(rpm)
            .with_ledger(ledger.clone())
            .with_memory(memory)
            .with_crew_run_id(run_id)
            .into_tools())
    }
}

#[async_trait]
impl Kickoff for Crew {
    async fn kickoff(&self, inputs: KickoffInputs) -> Result<CrewOutput> {
        self.run(&inputs).await
    }
}

/// Builder for [`Crew`]
pub struct CrewBuilder {
    agents: Vec<Arc<CrewAgent>>,
    tasks: Vec<Task>,
    process: Process,
    manager_llm: Option<Arc<dyn LLMProvider>>,
    manager_model: String,
    manager_max_iter: usize,
    max_rpm: Option<u32>,
    full_output: bool,
    verbose: bool,
}

impl CrewBuilder {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            tasks: Vec::new(),
            process: Process::Sequential,
            manager_llm: None,
            manager_model: "gpt-3.5-turbo".to_string(),
            manager_max_iter: 15,
            max_rpm: None,
            full_output: false,
            verbose: false,
        }
    }

    pub fn agent(mut self, agent: impl Into<Arc<CrewAgent>>) -> Self {
        self.agents.push(agent.into());
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    /// LLM for the manager agent of a hierarchical crew
    pub fn manager_llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.manager_llm = Some(llm);
        self
    }

    pub fn manager_model(mut self, model: impl Into<String>) -> Self {
        self.manager_model = model.into();
        self
    }

    pub fn manager_max_iter(mut self, max_iter: usize) -> Self {
        self.manager_max_iter = max_iter;
        self
    }

    /// Crew-wide RPM budget, replacing every agent's own limit
    pub fn max_rpm(mut self, max_rpm: u32) -> Self {
        self.max_rpm = Some(max_rpm);
        self
    }

    pub fn full_output(mut self, full_output: bool) -> Self {
        self.full_output = full_output;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Result<Crew> {
        self.validate()?;

        let manager = match (self.process, self.manager_llm) {
            (Process::Hierarchical, Some(llm)) => Some(Arc::new(
                CrewAgent::builder(MANAGER_ROLE)
                    .goal(MANAGER_GOAL)
                    .backstory(MANAGER_BACKSTORY)
                    .llm(llm)
                    .model(self.manager_model)
                    .max_iter(self.manager_max_iter)
                    .verbose(self.verbose)
                    .build()?,
            )),
            _ => None,
        };

        Ok(Crew {
            agents: self.agents,
            tasks: self.tasks,
            process: self.process,
            manager,
            max_rpm: self.max_rpm,
            full_output: self.full_output,
            verbose: self.verbose,
        })
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(Error::InitializationFailed(msg)) };

        if self.agents.is_empty() {
            return invalid("crew needs at least one agent".to_string());
        }
        if self.tasks.is_empty() {
            return invalid("crew needs at least one task".to_string());
        }
        if self.process == Process::Hierarchical && self.manager_llm.is_none() {
            return invalid("hierarchical crew requires a manager LLM".to_string());
        }

        for (index, task) in self.tasks.iter().enumerate() {
            let label = task.name().map_or_else(|| format!("task {index}"), ToString::to_string);
            match task.agent() {
                Some(role)
                    if !self
                        .agents
                        .iter()
                        .any(|a| a.role().trim().eq_ignore_ascii_case(role.trim())) =>
                {
                    return invalid(format!("{label} is assigned to unknown agent '{role}'"));
                }
                None if self.process == Process::Sequential => {
                    return invalid(format!("{label} has no agent in a sequential crew"));
                }
                _ => {}
            }
            if let Some(&bad) = task.context().and_then(|c| c.iter().find(|&&i| i >= index)) {
                return invalid(format!(
                    "{label} uses task {bad} as context, context must come from earlier tasks"
                ));
            }
        }
        Ok(())
    }
}

impl Default for CrewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, answer, tool_call, tool_results};
    use serde_json::json;

    fn agent(role: &str, provider: &Arc<ScriptedProvider>) -> CrewAgent {
        CrewAgent::builder(role)
            .goal("Work on {{ ticker }}")
            .backstory("Experienced.")
            .llm(provider.clone())
            .build()
            .unwrap()
    }

    fn task(description: &str, role: Option<&str>) -> Task {
        let builder = Task::builder(description).expected_output("A report");
        let builder = match role {
            Some(role) => builder.agent(role),
            None => builder,
        };
        builder.build().unwrap()
    }

    fn first_prompt(provider: &ScriptedProvider, call: usize) -> String {
        provider.requests()[call].messages[0].text().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_sequential_passes_previous_output() {
        let provider = Arc::new(ScriptedProvider::new([answer("price up"), answer("newsletter")]));
        let crew = Crew::builder()
            .agent(agent("Analyst", &provider))
            .agent(agent("Writer", &provider))
            .task(task("Price of {{ ticker }}", Some("analyst")))
            .task(task("Write about {{ ticker }}", Some("Writer")))
            .full_output(true)
            .build()
            .unwrap();

        let output = crew.kickoff(KickoffInputs::from([("ticker", "AAPL")])).await.unwrap();

        assert_eq!(output.final_output, "newsletter");
        assert_eq!(output.tasks_outputs.len(), 2);
        assert_eq!(output.tasks_outputs[0].agent, "Analyst");
        assert_eq!(output.tasks_outputs[0].description, "Price of AAPL");
        assert_eq!(output.token_usage.total(), 30);

        let second = first_prompt(&provider, 1);
        assert!(second.starts_with("Write about AAPL"));
        assert!(second.ends_with("This is the context you're working with:\nprice up"));
        assert!(provider.requests()[1].system.as_deref().unwrap().starts_with("You are Writer."));
    }

    #[tokio::test]
    async fn test_tasks_outputs_only_with_full_output() {
        let provider = Arc::new(ScriptedProvider::new([answer("done")]));
        let crew = Crew::builder()
            .agent(agent("Analyst", &provider))
            .task(task("Go {{ ticker }}", Some("Analyst")))
            .build()
            .unwrap();

        let output = tokio_test::assert_ok!(crew.run(&KickoffInputs::from([("ticker", "X")])).await);
        assert_eq!(output.final_output, "done");
        assert!(output.tasks_outputs.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_context_selects_tasks() {
        let provider = Arc::new(ScriptedProvider::new([
            answer("first"),
            answer("second"),
            answer("third"),
        ]));
        let crew = Crew::builder()
            .agent(agent("Analyst", &provider))
            .task(task("One", Some("Analyst")))
            .task(task("Two", Some("Analyst")))
            .task(
                Task::builder("Three")
                    .expected_output("x")
                    .agent("Analyst")
                    .context([0])
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        crew.run(&KickoffInputs::from([("ticker", "X")])).await.unwrap();
        let third = first_prompt(&provider, 2);
        assert!(third.contains("working with:\nfirst"));
        assert!(!third.contains("second"));
    }

    #[tokio::test]
    async fn test_memory_shows_earlier_results() {
        let provider = Arc::new(ScriptedProvider::new([answer("found greed"), answer("ok")]));
        let remembering = CrewAgent::builder("Writer")
            .goal("Write")
            .llm(provider.clone())
            .memory(true)
            .build()
            .unwrap();
        let crew = Crew::builder()
            .agent(agent("Analyst", &provider))
            .agent(remembering)
            .task(task("Research", Some("Analyst")))
            .task(task("Write", Some("Writer")))
            .build()
            .unwrap();

        crew.run(&KickoffInputs::from([("ticker", "X")])).await.unwrap();
        assert!(!first_prompt(&provider, 0).contains("Relevant memory"));
        let second = first_prompt(&provider, 1);
        assert!(second.contains("## Relevant memory"));
        assert!(second.contains("Analyst completed \"Research\": found greed"));
    }

    #[tokio::test]
    async fn test_missing_input_fails_kickoff() {
        let provider = Arc::new(ScriptedProvider::default());
        let crew = Crew::builder()
            .agent(agent("Analyst", &provider))
            .task(task("Price of {{ ticker }}", Some("Analyst")))
            .build()
            .unwrap();

        let err = crew.run(&KickoffInputs::from([("symbol", "X")])).await.unwrap_err();
        assert!(matches!(err, Error::Template(_)));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_sequential_delegation_tools_exclude_self() {
        let provider = Arc::new(ScriptedProvider::new([answer("done")]));
        let writer = CrewAgent::builder("Writer")
            .llm(provider.clone())
            .allow_delegation(true)
            .build()
            .unwrap();
        let crew = Crew::builder()
            .agent(agent("Analyst", &provider))
            .agent(writer)
            .task(task("Write", Some("Writer")))
            .build()
            .unwrap();

        crew.run(&KickoffInputs::from([("ticker", "X")])).await.unwrap();
        let tools = provider.requests()[0].tools.clone().unwrap();
        assert_eq!(tools.len(), 2);
        assert!(tools[0].description.contains("coworkers: Analyst"));
        assert!(!tools[0].description.contains("Writer"));
    }

    #[tokio::test]
    async fn test_hierarchical_manager_delegates() {
        let manager_llm = Arc::new(ScriptedProvider::new([
            tool_call(
                "call_1",
                "delegate_work_to_coworker",
                json!({ "coworker": "analyst", "task": "Get TSLA price", "context": "none" }),
            ),
            answer("TSLA newsletter"),
        ]));
        let worker_llm = Arc::new(ScriptedProvider::new([answer("TSLA up 3%")]));

        let crew = Crew::builder()
            .agent(agent("Analyst", &worker_llm))
            .task(task("Analyze {{ ticker }}", Some("Analyst")))
            .process(Process::Hierarchical)
            .manager_llm(manager_llm.clone())
            .manager_model("manager-model")
            .max_rpm(100)
            .full_output(true)
            .build()
            .unwrap();
        assert_eq!(crew.manager().unwrap().role(), MANAGER_ROLE);

        let output = crew.kickoff(KickoffInputs::from([("ticker", "TSLA")])).await.unwrap();
        assert_eq!(output.final_output, "TSLA newsletter");
        assert_eq!(output.tasks_outputs[0].agent, MANAGER_ROLE);
        assert_eq!(output.token_usage.total(), 45);

        let manager_requests = manager_llm.requests();
        assert_eq!(manager_requests[0].model, "manager-model");
        assert!(first_prompt(&manager_llm, 0)
            .ends_with("The preferred coworker for this task is: Analyst"));
        let tool_names: Vec<_> = manager_requests[0]
            .tools
            .as_ref()
            .unwrap()
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(tool_names, vec!["ask_question_to_coworker", "delegate_work_to_coworker"]);
        assert_eq!(
            tool_results(&manager_requests[1]),
            vec![("TSLA up 3%".to_string(), false)]
        );

        let worker_request = &worker_llm.requests()[0];
        assert!(worker_request.tools.is_none());
        assert!(first_prompt(&worker_llm, 0).starts_with("Get TSLA price"));
    }

    #[tokio::test]
    async fn test_kickoff_through_trait_object() {
        let provider = Arc::new(ScriptedProvider::new([answer("report")]));
        let crew: Arc<dyn Kickoff> = Arc::new(
            Crew::builder()
                .agent(agent("Analyst", &provider))
                .task(task("Go", Some("Analyst")))
                .build()
                .unwrap(),
        );
        let output = crew.kickoff(KickoffInputs::from([("ticker", "X")])).await.unwrap();
        assert_eq!(output.final_output, "report");
    }

    #[test]
    fn test_validation() {
        let provider = Arc::new(ScriptedProvider::default());

        let no_tasks = Crew::builder().agent(agent("A", &provider)).build();
        assert!(no_tasks.unwrap_err().to_string().contains("at least one task"));

        let unassigned = Crew::builder()
            .agent(agent("A", &provider))
            .task(task("t", None))
            .build();
        assert!(unassigned.unwrap_err().to_string().contains("no agent"));

        let unknown = Crew::builder()
            .agent(agent("A", &provider))
            .task(task("t", Some("B")))
            .build();
        assert!(unknown.unwrap_err().to_string().contains("unknown agent 'B'"));

        let no_manager = Crew::builder()
            .agent(agent("A", &provider))
            .task(task("t", None))
            .process(Process::Hierarchical)
            .build();
        assert!(no_manager.unwrap_err().to_string().contains("manager LLM"));

        let forward_context = Crew::builder()
            .agent(agent("A", &provider))
            .task(
                Task::builder("t")
                    .expected_output("x")
                    .agent("A")
                    .context([0])
                    .build()
                    .unwrap(),
            )
            .build();
        assert!(forward_context.unwrap_err().to_string().contains("earlier tasks"));

        let unassigned_hierarchical = Crew::builder()
            .agent(agent("A", &provider))
            .task(task("t", None))
            .process(Process::Hierarchical)
            .manager_llm(provider.clone())
            .build();
        assert!(unassigned_hierarchical.is_ok());
    }
}
