//! Errors raised while talking to a chat-completions endpoint

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LLMError>;

/// Provider failure
///
/// The OpenAI provider maps HTTP statuses as follows: 401 to
/// `AuthenticationFailed`, 429 to `RateLimitExceeded`, 400 to
/// `InvalidRequest` and 404 to `ModelNotFound`. Any other non-2xx status is
/// `RequestFailed`.
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("Completion request failed: {0}")]
    RequestFailed(String),

    /// The API key was rejected
    #[error("API key rejected by the provider")]
    AuthenticationFailed,

    #[error("Provider rate limit hit: {0}")]
    RateLimitExceeded(String),

    /// The provider refused the request body
    #[error("Request rejected: {0}")]
    InvalidRequest(String),

    #[error("Unknown model: {0}")]
    ModelNotFound(String),

    #[error("JSON encoding failed: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Transport failure, including timeouts
    #[error("HTTP transport error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The body parsed but did not have the expected shape
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Provider misconfigured, e.g. a blank API key
    #[error("Provider configuration error: {0}")]
    ConfigurationError(String),
}
