//! How a crew assigns its tasks

use serde::{Deserialize, Serialize};
use std::fmt;

/// Task execution strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    /// Each task runs on its assigned agent, in order
    #[default]
    Sequential,

    /// A manager agent runs every task and delegates to the crew's agents
    Hierarchical,
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Process::Hierarchical).unwrap(), "\"hierarchical\"");
        let parsed: Process = serde_json::from_str("\"sequential\"").unwrap();
        assert_eq!(parsed, Process::default());
        assert_eq!(Process::Hierarchical.to_string(), "hierarchical");
    }
}
