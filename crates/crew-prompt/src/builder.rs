//! Prompt assembly
//!
//! [`PromptBuilder`] glues together the user message an agent receives for a
//! task: the rendered description, the expected output, context carried over
//! from earlier tasks and the crew's memory.

/// Concatenates prompt pieces in order
///
/// # Examples
///
/// ```
/// use crew_prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new()
///     .text("Analyze the AAPL stock.")
///     .blank_line()
///     .when(false, "never shown")
///     .section("Context")
///     .bullet("trend: up")
///     .build();
///
/// assert_eq!(prompt, "Analyze the AAPL stock.\n\n\n## Context\n- trend: up\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    parts: Vec<String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text verbatim
    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.parts.push(content.into());
        self
    }

    /// Two newlines, ending the current paragraph
    pub fn blank_line(self) -> Self {
        self.text("\n\n")
    }

    /// A `## title` heading on its own line
    pub fn section(self, title: impl Into<String>) -> Self {
        self.text(format!("\n## {}\n", title.into()))
    }

    /// A `- item` line
    pub fn bullet(self, content: impl Into<String>) -> Self {
        self.text(format!("- {}\n", content.into()))
    }

    /// Append `content` only when `condition` holds
    pub fn when(self, condition: bool, content: impl Into<String>) -> Self {
        if condition { self.text(content) } else { self }
    }

    pub fn build(self) -> String {
        self.parts.concat()
    }
}
