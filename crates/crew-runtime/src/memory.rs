//! Short-term memory of a crew run

use crew_prompt::PromptBuilder;

/// One remembered task result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    pub agent: String,
    pub task: String,
    pub output: String,
}

/// Ordered record of the task outputs completed so far in a run
///
/// Agents with memory enabled get it rendered into their task prompt, so
/// later tasks can build on what earlier agents found even without an
/// explicit context link.
#[derive(Debug, Clone, Default)]
pub struct ShortTermMemory {
    entries: Vec<MemoryEntry>,
}

impl ShortTermMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        agent: impl Into<String>,
        task: impl Into<String>,
        output: impl Into<String>,
    ) {
        self.entries.push(MemoryEntry {
            agent: agent.into(),
            task: task.into(),
            output: output.into(),
        });
    }

    /// Prompt section listing what has been done, or `None` when empty
    pub fn render(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        let mut builder = PromptBuilder::new()
            .section("Relevant memory")
            .text("Results already produced by the crew in this run:\n");
        for entry in &self.entries {
            builder = builder.bullet(format!(
                "{} completed \"{}\": {}",
                entry.agent,
                first_line(&entry.task),
                entry.output
            ));
        }
        Some(builder.build())
    }
}

fn first_line(text: &str) -> &str {
    text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_memory_renders_nothing() {
        assert!(ShortTermMemory::new().render().is_none());
    }

    #[test]
    fn test_render_lists_entries_in_order() {
        let mut memory = ShortTermMemory::new();
        memory.record("Analyst", "\n  Get the price\n  and more", "Trend up");
        memory.record("Writer", "Write", "Newsletter");

        let rendered = memory.render().unwrap();
        assert!(rendered.contains("## Relevant memory"));
        let first = rendered.find("- Analyst completed \"Get the price\": Trend up").unwrap();
        let second = rendered.find("- Writer completed \"Write\": Newsletter").unwrap();
        assert!(first < second);
        assert_eq!(rendered.matches("\n- ").count(), 2);
    }
}
