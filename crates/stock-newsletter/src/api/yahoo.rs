//! Yahoo Finance API client

use super::{PriceBar, PriceHistorySource};
use crate::error::{NewsletterError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Yahoo Finance API client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient {}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {}
    }
}

fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime> {
    let timestamp = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| NewsletterError::YahooFinanceError(format!("Invalid date {date}: {e}")))
}

#[async_trait]
impl PriceHistorySource for YahooFinanceClient {
    async fn history(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| NewsletterError::YahooFinanceError(e.to_string()))?;

        debug!(ticker = %ticker, start = %start, end = %end, "Fetching price history");
        let response = provider
            .get_quote_history(ticker, to_offset_datetime(start)?, to_offset_datetime(end)?)
            .await
            .map_err(|e| NewsletterError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| NewsletterError::YahooFinanceError(e.to_string()))?;

        Ok(quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(PriceBar {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    adj_close: q.adjclose,
                    volume: q.volume,
                })
            })
            .collect())
    }
}
