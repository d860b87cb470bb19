//! Error types for the newsletter application

use thiserror::Error;

/// Newsletter specific errors
#[derive(Debug, Error)]
pub enum NewsletterError {
    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// No price history for the requested ticker and window
    #[error("Data not available for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Page template error
    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    /// Crew construction or run failed
    #[error(transparent)]
    Crew(#[from] crew_core::Error),
}

/// Result type alias for newsletter operations
pub type Result<T> = std::result::Result<T, NewsletterError>;

impl From<NewsletterError> for crew_core::Error {
    fn from(err: NewsletterError) -> Self {
        match err {
            NewsletterError::Crew(inner) => inner,
            other => crew_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}
