//! Configuration for the newsletter crew

use crate::error::{NewsletterError, Result};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Default OpenAI chat model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for one newsletter deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsletterConfig {
    /// Chat model used by every agent and the manager
    pub model: String,

    /// OpenAI-compatible API base, `None` for api.openai.com
    pub api_base: Option<String>,

    /// LLM request timeout
    pub request_timeout: Duration,

    /// Sampling temperature, `None` for the provider default
    pub temperature: Option<f32>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// First day of the price history handed to the price analyst
    pub history_start: NaiveDate,

    /// Last day of the price history
    pub history_end: NaiveDate,

    /// News results returned per search
    pub news_results: usize,

    /// Crew-wide requests per minute, also applied to news searches; 0 for no limit
    pub max_rpm: u32,

    /// Iteration budget of the crew manager and the analysts
    pub max_iter: usize,

    /// Web UI listen address
    pub listen_addr: SocketAddr,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        let history_end = Utc::now().date_naive();
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: None,
            request_timeout: Duration::from_secs(120),
            temperature: None,
            max_tokens: 4096,
            history_start: history_end - Days::new(365),
            history_end,
            news_results: 10,
            max_rpm: 15,
            max_iter: 15,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8501)),
        }
    }
}

impl NewsletterConfig {
    /// Create a new configuration builder
    pub fn builder() -> NewsletterConfigBuilder {
        NewsletterConfigBuilder::default()
    }

    /// Load from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using a custom variable lookup
    ///
    /// Reads `OPENAI_MODEL`, `OPENAI_API_BASE`, `OPENAI_TIMEOUT_SECS`,
    /// `OPENAI_TEMPERATURE`, `OPENAI_MAX_TOKENS`, `HISTORY_START`,
    /// `HISTORY_END`, `NEWS_RESULTS`, `CREW_MAX_RPM`, `CREW_MAX_ITER` and
    /// `LISTEN_ADDR`. Unset or blank variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();

        if let Some(model) = var("OPENAI_MODEL") {
            builder = builder.model(model);
        }
        if let Some(api_base) = var("OPENAI_API_BASE") {
            builder = builder.api_base(api_base);
        }
        if let Some(secs) = parse_var::<u64>(&var, "OPENAI_TIMEOUT_SECS")? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(temperature) = parse_var::<f32>(&var, "OPENAI_TEMPERATURE")? {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = parse_var(&var, "OPENAI_MAX_TOKENS")? {
            builder = builder.max_tokens(max_tokens);
        }
        if let Some(start) = parse_var(&var, "HISTORY_START")? {
            builder = builder.history_start(start);
        }
        if let Some(end) = parse_var(&var, "HISTORY_END")? {
            builder = builder.history_end(end);
        }
        if let Some(count) = parse_var(&var, "NEWS_RESULTS")? {
            builder = builder.news_results(count);
        }
        if let Some(rpm) = parse_var(&var, "CREW_MAX_RPM")? {
            builder = builder.max_rpm(rpm);
        }
        if let Some(iterations) = parse_var(&var, "CREW_MAX_ITER")? {
            builder = builder.max_iter(iterations);
        }
        if let Some(addr) = parse_var(&var, "LISTEN_ADDR")? {
            builder = builder.listen_addr(addr);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(NewsletterError::ConfigError("model must not be empty".to_string()));
        }
        if self.news_results == 0 {
            return Err(NewsletterError::ConfigError(
                "news_results must be greater than 0".to_string(),
            ));
        }
        if self.max_iter == 0 {
            return Err(NewsletterError::ConfigError(
                "max_iter must be greater than 0".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(NewsletterError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if self.history_start > self.history_end {
            return Err(NewsletterError::ConfigError(format!(
                "history_start {} is after history_end {}",
                self.history_start, self.history_end
            )));
        }
        Ok(())
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                NewsletterError::ConfigError(format!("invalid {key} value '{raw}': {e}"))
            })
        })
        .transpose()
}

/// Builder for NewsletterConfig
#[derive(Debug, Default)]
pub struct NewsletterConfigBuilder {
    model: Option<String>,
    api_base: Option<String>,
    request_timeout: Option<Duration>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    history_start: Option<NaiveDate>,
    history_end: Option<NaiveDate>,
    news_results: Option<usize>,
    max_rpm: Option<u32>,
    max_iter: Option<usize>,
    listen_addr: Option<SocketAddr>,
}

impl NewsletterConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn history_start(mut self, start: NaiveDate) -> Self {
        self.history_start = Some(start);
        self
    }

    /// Set the last day of the window; without an explicit start the
    /// window still covers the year before it
    pub fn history_end(mut self, end: NaiveDate) -> Self {
        self.history_end = Some(end);
        self
    }

    pub fn news_results(mut self, count: usize) -> Self {
        self.news_results = Some(count);
        self
    }

    pub fn max_rpm(mut self, rpm: u32) -> Self {
        self.max_rpm = Some(rpm);
        self
    }

    pub fn max_iter(mut self, iterations: usize) -> Self {
        self.max_iter = Some(iterations);
        self
    }

    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = Some(addr);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<NewsletterConfig> {
        let defaults = NewsletterConfig::default();
        let history_end = self.history_end.unwrap_or(defaults.history_end);

        let config = NewsletterConfig {
            model: self.model.unwrap_or(defaults.model),
            api_base: self.api_base.or(defaults.api_base),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            temperature: self.temperature.or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            history_start: self
                .history_start
                .unwrap_or_else(|| history_end - Days::new(365)),
            history_end,
            news_results: self.news_results.unwrap_or(defaults.news_results),
            max_rpm: self.max_rpm.unwrap_or(defaults.max_rpm),
            max_iter: self.max_iter.unwrap_or(defaults.max_iter),
            listen_addr: self.listen_addr.unwrap_or(defaults.listen_addr),
        };

        config.validate()?;
        Ok(config)
    }
}
