//! MiniJinja-backed prompt template

use crate::{PromptError, Result};
use minijinja::{Environment, UndefinedBehavior};
use std::collections::BTreeSet;

/// A named prompt template with `{{ placeholder }}` slots
///
/// The source is parsed once at construction so syntax errors surface when
/// the agent or task is defined, not when the crew runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: String,
    source: String,
}

impl PromptTemplate {
    /// Parse a template
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let template = Self {
            name: name.into(),
            source: source.into(),
        };
        template.variables()?;
        Ok(template)
    }

    /// Template name, used in error messages
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw template source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholders the template reads from its inputs
    pub fn variables(&self) -> Result<BTreeSet<String>> {
        let env = environment();
        let template =
            env.template_from_str(&self.source)
                .map_err(|e| PromptError::TemplateParseFailed {
                    name: self.name.clone(),
                    detail: e.to_string(),
                })?;
        Ok(template.undeclared_variables(false).into_iter().collect())
    }

    /// Render with the given variables
    pub fn render(&self, vars: &serde_json::Value) -> Result<String> {
        let env = environment();
        env.render_str(&self.source, minijinja::Value::from_serialize(vars))
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_with_inputs() {
        let template =
            PromptTemplate::new("goal", "Find the {{ ticker }} stock price and trends").unwrap();
        let out = template.render(&json!({ "ticker": "TSLA" })).unwrap();
        assert_eq!(out, "Find the TSLA stock price and trends");
    }

    #[test]
    fn test_missing_input_is_error() {
        let template = PromptTemplate::new("goal", "Find {{ ticker }}").unwrap();
        let err = template.render(&json!({ "symbol": "TSLA" })).unwrap_err();
        assert!(matches!(err, PromptError::RenderError { .. }));
        assert!(err.to_string().contains("goal"));
    }

    #[test]
    fn test_plain_text_needs_no_inputs() {
        let template = PromptTemplate::new("backstory", "You are experienced.").unwrap();
        assert!(template.variables().unwrap().is_empty());
        assert_eq!(template.render(&json!({})).unwrap(), "You are experienced.");
    }

    #[test]
    fn test_variables_lists_placeholders() {
        let template =
            PromptTemplate::new("task", "{{ ticker }} on {{ current_date }}, {{ ticker }}")
                .unwrap();
        let vars: Vec<_> = template.variables().unwrap().into_iter().collect();
        assert_eq!(vars, vec!["current_date", "ticker"]);
    }

    #[test]
    fn test_syntax_error_rejected_at_construction() {
        let result = PromptTemplate::new("broken", "Analyze {{ ticker ");
        assert!(matches!(result, Err(PromptError::TemplateParseFailed { .. })));
    }

    #[test]
    fn test_single_braces_are_literal() {
        let template = PromptTemplate::new("example", "Eg. stock= 'APPL, price UP' {x}").unwrap();
        assert_eq!(
            template.render(&json!({})).unwrap(),
            "Eg. stock= 'APPL, price UP' {x}"
        );
    }
}
