//! How a tool is described to the model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name, description and argument schema of one callable tool
///
/// The OpenAI provider sends these as `function` tools; `name` is what the
/// model echoes back in a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the call arguments
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// JSON schema helpers for tool arguments
pub mod schema {
    use serde_json::{Value, json};

    /// An object schema with the given properties and required keys
    ///
    /// # Example
    ///
    /// ```
    /// use crew_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({ "query": schema::string("Search query") }),
    ///     &["query"],
    /// );
    /// assert_eq!(schema["required"][0], "query");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// A described string property
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition_creation() {
        let schema = schema::object(json!({ "ticker": schema::string("Ticker") }), &["ticker"]);

        let tool = ToolDefinition::new("Yahoo Finance Tool", "Fetch prices", schema.clone());
        assert_eq!(tool.name, "Yahoo Finance Tool");
        assert_eq!(tool.input_schema, schema);
        assert_eq!(schema["properties"]["ticker"]["type"], "string");
    }
}
