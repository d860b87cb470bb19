//! Tasks and their outputs

use crew_core::{Error, Result};
use crew_prompt::{PromptBuilder, PromptTemplate};
use serde::{Deserialize, Serialize};

/// A unit of work for the crew
///
/// `description` and `expected_output` are templates rendered with the
/// kickoff inputs. `context` lists earlier tasks (by position) whose outputs
/// are handed to this one.
#[derive(Debug, Clone)]
pub struct Task {
    name: Option<String>,
    description: PromptTemplate,
    expected_output: PromptTemplate,
    agent: Option<String>,
    context: Option<Vec<usize>>,
}

/// What a task produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Rendered task description
    pub description: String,

    /// The agent's final answer
    pub raw: String,

    /// Role of the agent that produced it
    pub agent: String,
}

impl Task {
    pub fn builder(description: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(description)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Role of the assigned agent, if any
    pub fn agent(&self) -> Option<&str> {
        self.agent.as_deref()
    }

    /// Explicit context tasks; `None` means "the previous task's output"
    pub fn context(&self) -> Option<&[usize]> {
        self.context.as_deref()
    }

    pub fn description(&self) -> &PromptTemplate {
        &self.description
    }

    /// Render the description with the kickoff inputs
    pub fn interpolate_description(&self, vars: &serde_json::Value) -> Result<String> {
        Ok(self.description.render(vars)?)
    }

    /// Build the prompt an agent receives for this task
    pub fn prompt(&self, vars: &serde_json::Value, context_outputs: &[&TaskOutput]) -> Result<String> {
        let description = self.description.render(vars)?;
        let expected_output = self.expected_output.render(vars)?;

        let context = context_outputs
            .iter()
            .map(|output| output.raw.as_str())
            .collect::<Vec<_>>()
            .join("\n\n----------\n\n");

        Ok(PromptBuilder::new()
            .text(description.trim())
            .blank_line()
            .text(format!(
                "This is the expect criteria for your final answer: {}\n",
                expected_output.trim()
            ))
            .text("You MUST return the actual complete content as the final answer, not a summary.")
            .when(
                !context.is_empty(),
                format!("\n\nThis is the context you're working with:\n{context}"),
            )
            .build())
    }
}

/// Builder for [`Task`]
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    name: Option<String>,
    description: String,
    expected_output: Option<String>,
    agent: Option<String>,
    context: Option<Vec<usize>>,
}

impl TaskBuilder {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            name: None,
            description: description.into(),
            expected_output: None,
            agent: None,
            context: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = Some(expected_output.into());
        self
    }

    /// Assign the task to the agent with this role
    pub fn agent(mut self, role: impl Into<String>) -> Self {
        self.agent = Some(role.into());
        self
    }

    /// Feed the outputs of these earlier tasks into this one
    pub fn context(mut self, tasks: impl IntoIterator<Item = usize>) -> Self {
        self.context = Some(tasks.into_iter().collect());
        self
    }

    pub fn build(self) -> Result<Task> {
        let label = self.name.clone().unwrap_or_else(|| "task".to_string());
        let expected_output = self.expected_output.ok_or_else(|| {
            Error::InitializationFailed(format!("{label} is missing an expected output"))
        })?;

        Ok(Task {
            description: PromptTemplate::new(format!("{label}.description"), self.description)?,
            expected_output: PromptTemplate::new(
                format!("{label}.expected_output"),
                expected_output,
            )?,
            name: self.name,
            agent: self.agent,
            context: self.context,
        })
    }
}
