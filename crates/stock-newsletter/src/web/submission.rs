//! Research form handling

use crate::crew::TICKER_INPUT;
use crew_runtime::{Kickoff, KickoffInputs};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Shown when the form is submitted without a ticker
pub const MISSING_TICKER: &str = "Please fill the ticket";

/// The sidebar research form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchForm {
    #[serde(default)]
    pub ticker: String,
}

impl ResearchForm {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
        }
    }
}

/// Outcome of one form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Rejected before the crew ran
    Invalid(String),
    /// The crew's final newsletter
    Completed(String),
    /// The crew run failed
    Failed(String),
}

/// Validate the form and run the crew for its ticker
///
/// The ticker is handed to the crew exactly as typed.
pub async fn submit(form: &ResearchForm, crew: &dyn Kickoff) -> Submission {
    if form.ticker.trim().is_empty() {
        warn!("Research submitted without a ticker");
        return Submission::Invalid(MISSING_TICKER.to_string());
    }

    info!(ticker = %form.ticker, "Running research");
    let inputs = KickoffInputs::new().with(TICKER_INPUT, form.ticker.as_str());
    match crew.kickoff(inputs).await {
        Ok(output) => {
            info!(
                ticker = %form.ticker,
                total_tokens = output.token_usage.total(),
                "Research finished"
            );
            Submission::Completed(output.final_output)
        }
        Err(e) => {
            error!(ticker = %form.ticker, error = %e, "Research failed");
            Submission::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use crew_core::{Error, Result};
    use crew_llm::TokenUsage;
    use crew_runtime::CrewOutput;
    use std::sync::Mutex;

    /// Kickoff double that records its inputs
    pub(crate) struct RecordingCrew {
        pub(crate) calls: Mutex<Vec<KickoffInputs>>,
        reply: std::result::Result<String, String>,
    }

    impl RecordingCrew {
        pub(crate) fn answering(text: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply: Ok(text.to_string()),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply: Err(message.to_string()),
            }
        }
    }

    #[async_trait]
    impl Kickoff for RecordingCrew {
        async fn kickoff(&self, inputs: KickoffInputs) -> Result<CrewOutput> {
            self.calls.lock().unwrap().push(inputs);
            match &self.reply {
                Ok(text) => Ok(CrewOutput {
                    final_output: text.clone(),
                    tasks_outputs: Vec::new(),
                    token_usage: TokenUsage::default(),
                }),
                Err(message) => Err(Error::ProcessingFailed(message.clone())),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_ticker_never_kicks_off() {
        let crew = RecordingCrew::answering("unused");

        for ticker in ["", "   ", "\t\n"] {
            let outcome = submit(&ResearchForm::new(ticker), &crew).await;
            assert_eq!(outcome, Submission::Invalid("Please fill the ticket".to_string()));
        }
        assert!(crew.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ticker_is_passed_through_unchanged() {
        let crew = RecordingCrew::answering("# AAPL newsletter");

        let outcome = submit(&ResearchForm::new(" aapl "), &crew).await;

        assert_eq!(outcome, Submission::Completed("# AAPL newsletter".to_string()));
        let calls = crew.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get("ticker"), Some(" aapl "));
        assert_eq!(calls[0].len(), 1);
    }

    #[tokio::test]
    async fn test_crew_failure_is_reported() {
        let crew = RecordingCrew::failing("LLM unavailable");

        let outcome = submit(&ResearchForm::new("MSFT"), &crew).await;

        let Submission::Failed(message) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(message.contains("LLM unavailable"));
    }

    #[test]
    fn test_form_without_ticker_field() {
        let form: ResearchForm = serde_json::from_str("{}").unwrap();
        assert_eq!(form, ResearchForm::default());
    }
}
