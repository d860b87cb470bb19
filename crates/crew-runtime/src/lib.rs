//! Crew runtime for running role-based agents over a list of tasks
//!
//! A [`Crew`] owns a set of [`CrewAgent`]s and an ordered list of [`Task`]s.
//! Kicking it off with [`KickoffInputs`] renders every template with those
//! inputs and runs the tasks either sequentially on their assigned agents or
//! through a manager agent that delegates to coworkers.
//!
//! Each agent turn is an [`AgentExecutor`] loop: call the LLM, run any tools
//! it asks for, feed the results back, and stop at a final answer.

pub mod agent;
pub mod crew;
pub mod delegation;
pub mod executor;
pub mod inputs;
pub mod memory;
pub mod process;
pub mod rpm;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types
pub use agent::{CrewAgent, CrewAgentBuilder, Persona};
pub use crew::{Crew, CrewBuilder, CrewOutput, Kickoff};
pub use delegation::{AskQuestionTool, Coworkers, DelegateWorkTool};
pub use executor::{AgentExecutor, AgentExecutorBuilder, ExecutionOutcome, ExecutorConfig, UsageLedger};
pub use inputs::KickoffInputs;
pub use memory::ShortTermMemory;
pub use process::Process;
pub use rpm::RpmController;
pub use task::{Task, TaskBuilder, TaskOutput};
