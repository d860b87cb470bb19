//! Data providers behind the crew's tools

pub mod duckduckgo;
pub mod yahoo;

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use duckduckgo::DuckDuckGoNewsClient;
pub use yahoo::YahooFinanceClient;

/// One day of price history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// A news search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub excerpt: String,
    pub url: String,
    /// Publication time, RFC 3339
    pub date: Option<String>,
    pub source: String,
}

/// Daily price history provider
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    /// Daily bars for `ticker` from `start` to `end`, oldest first
    async fn history(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>>;
}

/// News search provider
#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// At most `max_results` articles matching `query`
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<NewsArticle>>;
}
