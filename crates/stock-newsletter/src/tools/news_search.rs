//! Tool for searching market news

use crew_core::Result as CrewResult;
use crew_tools::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::api::NewsSearch;

/// News search over DuckDuckGo's news tab
pub struct NewsSearchTool {
    search: Arc<dyn NewsSearch>,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct NewsSearchParams {
    query: String,
}

impl NewsSearchTool {
    pub fn new(search: Arc<dyn NewsSearch>, max_results: usize) -> Self {
        Self {
            search,
            max_results,
        }
    }
}

#[async_trait]
impl Tool for NewsSearchTool {
    async fn execute(&self, params: Value) -> CrewResult<Value> {
        let params: NewsSearchParams = serde_json::from_value(params).map_err(|e| {
            crew_core::Error::ProcessingFailed(format!("Invalid parameters: {e}"))
        })?;

        let articles = self.search.search(&params.query, self.max_results).await?;
        let results: Vec<Value> = articles
            .into_iter()
            .take(self.max_results)
            .map(|a| {
                json!({
                    "snippet": a.excerpt,
                    "title": a.title,
                    "link": a.url,
                    "date": a.date,
                    "source": a.source,
                })
            })
            .collect();

        Ok(Value::Array(results))
    }

    fn name(&self) -> &str {
        "duckduckgo_news_search"
    }

    fn description(&self) -> &str {
        "DuckDuckGo News Search: A wrapper around DuckDuckGo News Search. \
         Useful for when you need to answer questions about current events. \
         Input should be a search query. Output is a JSON array of the query results"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query, e.g. 'AAPL stock news'"
                }
            },
            "required": ["query"]
        })
    }
}
