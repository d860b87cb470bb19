//! Execution context for agents
//!
//! The `Context` struct carries run-scoped state (crew run id, the task being
//! worked on, kickoff inputs) from the crew runtime down to agents.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Identifier of the current crew run
    pub const CREW_RUN_ID: &str = "crew_run_id";
    /// Identifier of the task being executed
    pub const TASK_ID: &str = "task_id";
    /// Role of the agent executing the task
    pub const AGENT_ROLE: &str = "agent_role";
    /// Kickoff inputs as a JSON object
    pub const INPUTS: &str = "inputs";
}

/// Context passed to agents during execution
///
/// # Example
///
/// ```
/// use crew_core::Context;
///
/// let ctx = Context::new()
///     .with_crew_run_id("run-1")
///     .with_task_id("task-0");
///
/// assert_eq!(ctx.crew_run_id(), Some("run-1"));
/// assert_eq!(ctx.task_id(), Some("task-0"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the crew run ID
    pub fn with_crew_run_id(mut self, id: impl Into<String>) -> Self {
        self.insert(keys::CREW_RUN_ID, serde_json::json!(id.into()));
        self
    }

    /// Set the task ID
    pub fn with_task_id(mut self, id: impl Into<String>) -> Self {
        self.insert(keys::TASK_ID, serde_json::json!(id.into()));
        self
    }

    /// Set the kickoff inputs
    pub fn with_inputs(mut self, inputs: serde_json::Value) -> Self {
        self.insert(keys::INPUTS, inputs);
        self
    }

    /// Get the crew run ID
    pub fn crew_run_id(&self) -> Option<&str> {
        self.get_str(keys::CREW_RUN_ID)
    }

    /// Get the task ID
    pub fn task_id(&self) -> Option<&str> {
        self.get_str(keys::TASK_ID)
    }

    /// Get the role of the agent currently executing
    pub fn agent_role(&self) -> Option<&str> {
        self.get_str(keys::AGENT_ROLE)
    }

    /// Record the role of the agent currently executing
    pub fn set_agent_role(&mut self, role: impl Into<String>) {
        self.insert(keys::AGENT_ROLE, serde_json::json!(role.into()));
    }

    /// Get the kickoff inputs
    pub fn inputs(&self) -> Option<&serde_json::Value> {
        self.get(keys::INPUTS)
    }

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// Insert a typed value, serializing it to JSON
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::ProcessingFailed(format!("Failed to serialize context value: {e}"))
        })?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value, deserializing it from JSON
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        self.data
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::ProcessingFailed(format!(
                        "Failed to deserialize context value: {e}"
                    ))
                })
            })
            .transpose()
    }

    /// Check if a key exists in the context
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a value from the context
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merge another context into this one (other values override)
    pub fn merge(&mut self, other: Context) {
        self.data.extend(other.data);
    }
}
