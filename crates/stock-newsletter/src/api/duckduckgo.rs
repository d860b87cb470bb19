//! DuckDuckGo news search client
//!
//! DuckDuckGo has no official news API. The site's own news tab works in two
//! steps: the landing page embeds a per-query `vqd` token, and `news.js`
//! returns JSON results for that query and token.

use super::{NewsArticle, NewsSearch};
use crate::error::{NewsletterError, Result};
use async_trait::async_trait;
use chrono::DateTime;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const DEFAULT_BASE_URL: &str = "https://duckduckgo.com/";
/// `wt-wt` is DuckDuckGo's "no region"
const REGION: &str = "wt-wt";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Vec<RawNewsResult>,
}

#[derive(Debug, Deserialize)]
struct RawNewsResult {
    #[serde(default)]
    date: Option<i64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    source: String,
}

/// DuckDuckGo news client with rate limiting
pub struct DuckDuckGoNewsClient {
    client: Client,
    base_url: Url,
    rate_limiter: Option<SharedRateLimiter>,
    vqd_pattern: Regex,
    tag_pattern: Regex,
}

impl DuckDuckGoNewsClient {
    /// Create a client limited to `rate_limit` searches per minute, 0 for no limit
    pub fn new(rate_limit: u32) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        let rate_limiter = NonZeroU32::new(rate_limit)
            .map(|rpm| Arc::new(RateLimiter::direct(Quota::per_minute(rpm))));

        Ok(Self {
            client,
            base_url: parse_url(DEFAULT_BASE_URL)?,
            rate_limiter,
            vqd_pattern: compile(r#"vqd=["']?([\d-]+)["']?"#)?,
            tag_pattern: compile(r"<[^>]*>")?,
        })
    }

    /// Point the client at another host (a mirror or a local stub)
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_url(base_url)?;
        Ok(self)
    }

    async fn wait_for_slot(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    async fn fetch_vqd(&self, query: &str) -> Result<String> {
        let url = Url::parse_with_params(self.base_url.as_str(), &[("q", query)])
            .map_err(|e| NewsletterError::ApiError(format!("Invalid DuckDuckGo URL: {e}")))?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(NewsletterError::ApiError(format!(
                "DuckDuckGo landing page returned {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        self.extract_vqd(&html).ok_or_else(|| {
            NewsletterError::ApiError(format!("DuckDuckGo returned no vqd token for '{query}'"))
        })
    }

    fn extract_vqd(&self, html: &str) -> Option<String> {
        self.vqd_pattern
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn clean_text(&self, text: &str) -> String {
        let stripped = self.tag_pattern.replace_all(text, "");
        stripped
            .replace("&quot;", "\"")
            .replace("&#x27;", "'")
            .replace("&#39;", "'")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&")
            .trim()
            .to_string()
    }

    fn parse_results(&self, body: &str, max_results: usize) -> Result<Vec<NewsArticle>> {
        let response: NewsResponse = serde_json::from_str(body)?;
        Ok(response
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .take(max_results)
            .map(|r| NewsArticle {
                title: self.clean_text(&r.title),
                excerpt: self.clean_text(&r.excerpt),
                url: r.url,
                date: r
                    .date
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .map(|d| d.to_rfc3339()),
                source: r.source,
            })
            .collect())
    }
}

#[async_trait]
impl NewsSearch for DuckDuckGoNewsClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<NewsArticle>> {
        self.wait_for_slot().await;

        let vqd = self.fetch_vqd(query).await?;
        debug!(query = %query, "Obtained DuckDuckGo vqd token");

        let endpoint = self
            .base_url
            .join("news.js")
            .map_err(|e| NewsletterError::ApiError(format!("Invalid DuckDuckGo URL: {e}")))?;
        let response = self
            .client
            .get(endpoint)
            .query(&[
                ("l", REGION),
                ("o", "json"),
                ("noamp", "1"),
                ("q", query),
                ("vqd", vqd.as_str()),
                ("p", "-1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NewsletterError::ApiError(format!(
                "DuckDuckGo news error {status}: {body}"
            )));
        }

        let articles = self.parse_results(&response.text().await?, max_results)?;
        info!(query = %query, result_count = articles.len(), "DuckDuckGo news search completed");
        Ok(articles)
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| NewsletterError::ConfigError(format!("invalid URL '{raw}': {e}")))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| NewsletterError::ConfigError(e.to_string()))
}
