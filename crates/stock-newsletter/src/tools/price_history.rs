//! Tool for fetching a ticker's price history

use crew_core::Result as CrewResult;
use crew_tools::Tool;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::api::{PriceBar, PriceHistorySource};
use crate::error::{NewsletterError, Result};

/// Yahoo Finance price history over a fixed window
pub struct YahooFinanceTool {
    source: Arc<dyn PriceHistorySource>,
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct PriceHistoryParams {
    ticker: String,
}

impl YahooFinanceTool {
    pub fn new(source: Arc<dyn PriceHistorySource>, start: NaiveDate, end: NaiveDate) -> Self {
        Self { source, start, end }
    }

    async fn fetch(&self, ticker: &str) -> Result<Value> {
        let bars = self.source.history(ticker, self.start, self.end).await?;
        if bars.is_empty() {
            return Err(NewsletterError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: format!("no price history between {} and {}", self.start, self.end),
            });
        }

        Ok(json!({
            "ticker": ticker,
            "start": self.start.to_string(),
            "end": self.end.to_string(),
            "rows": bars.len(),
            "table": render_table(&bars),
        }))
    }
}

/// Fixed-width text table, one row per trading day
pub fn render_table(bars: &[PriceBar]) -> String {
    let mut table = format!(
        "{:<12}{:>12}{:>12}{:>12}{:>12}{:>12}{:>14}\n",
        "Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"
    );
    for bar in bars {
        table.push_str(&format!(
            "{:<12}{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>14}\n",
            bar.date.to_string(),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.adj_close,
            bar.volume
        ));
    }
    table
}

#[async_trait]
impl Tool for YahooFinanceTool {
    async fn execute(&self, params: Value) -> CrewResult<Value> {
        let params: PriceHistoryParams = serde_json::from_value(params).map_err(|e| {
            crew_core::Error::ProcessingFailed(format!("Invalid parameters: {e}"))
        })?;

        let ticker = params.ticker.trim();
        if ticker.is_empty() {
            return Err(crew_core::Error::ProcessingFailed(
                "ticker must not be empty".to_string(),
            ));
        }

        Ok(self.fetch(ticker).await?)
    }

    fn name(&self) -> &str {
        "yahoo_finance_tool"
    }

    fn description(&self) -> &str {
        "Yahoo Finance Tool: Fetches stocks prices for {ticker} from the last year about a specific stock"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol (e.g., 'AAPL', 'TSLA')"
                }
            },
            "required": ["ticker"]
        })
    }
}
