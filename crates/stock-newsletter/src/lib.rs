//! Stock newsletter crew
//!
//! Three agents research a stock ticker under a manager and write a short
//! markdown newsletter about it:
//!
//! - a price analyst reads a year of daily prices from Yahoo Finance
//! - a news analyst searches DuckDuckGo news for the stock, ADA and BTC and
//!   scores fear and greed per asset
//! - a writer combines both reports, asking the analysts for more if needed
//!
//! The crew is served through a small web UI or run once from the command
//! line.
//!
//! # Example
//!
//! ```rust,ignore
//! use crew_llm::providers::OpenAIProvider;
//! use crew_runtime::{Kickoff, KickoffInputs};
//! use stock_newsletter::{NewsletterConfig, build_crew};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let llm = Arc::new(OpenAIProvider::new(std::env::var("OPENAI_API_KEY")?)?);
//!     let crew = build_crew(llm, &NewsletterConfig::default())?;
//!
//!     let output = crew.kickoff(KickoffInputs::new().with("ticker", "AAPL")).await?;
//!     println!("{}", output.final_output);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod credentials;
pub mod crew;
pub mod error;
pub mod tools;
pub mod web;

pub use api::{
    DuckDuckGoNewsClient, NewsArticle, NewsSearch, PriceBar, PriceHistorySource,
    YahooFinanceClient,
};
pub use config::{DEFAULT_MODEL, NewsletterConfig, NewsletterConfigBuilder};
pub use credentials::{Credential, CredentialError, CredentialResolver, CredentialSource};
pub use crew::{TICKER_INPUT, build_crew, build_crew_with};
pub use error::{NewsletterError, Result};
pub use tools::{NewsSearchTool, YahooFinanceTool};
