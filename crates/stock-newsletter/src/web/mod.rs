//! Web UI
//!
//! A single page with the ticker form in a sidebar and the newsletter in the
//! main column. `POST /research` runs the crew for the submitted ticker.

mod page;
mod submission;

pub use page::Pages;
pub use submission::{MISSING_TICKER, ResearchForm, Submission, submit};

use crate::error::Result;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use crew_runtime::Kickoff;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    crew: Arc<dyn Kickoff>,
    pages: Arc<Pages>,
}

impl AppState {
    pub fn new(crew: Arc<dyn Kickoff>) -> Result<Self> {
        Ok(Self {
            crew,
            pages: Arc::new(Pages::new()?),
        })
    }
}

/// Build the web router around a crew
pub fn router(crew: Arc<dyn Kickoff>) -> Result<Router> {
    let state = AppState::new(crew)?;
    Ok(Router::new()
        .route("/", get(index))
        .route("/research", get(index).post(research))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index(State(st): State<AppState>) -> std::result::Result<Html<String>, AppError> {
    Ok(Html(st.pages.render("", None)?))
}

async fn research(
    State(st): State<AppState>,
    Form(form): Form<ResearchForm>,
) -> std::result::Result<(StatusCode, Html<String>), AppError> {
    let submission = submit(&form, st.crew.as_ref()).await;
    let status = match submission {
        Submission::Completed(_) => StatusCode::OK,
        Submission::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Submission::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let html = st.pages.render(&form.ticker, Some(&submission))?;
    Ok((status, Html(html)))
}

#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(value: E) -> Self {
        Self(value.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::submission::tests::RecordingCrew;
    use super::*;

    fn state(crew: &Arc<RecordingCrew>) -> AppState {
        AppState::new(crew.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_index_shows_form() {
        let crew = Arc::new(RecordingCrew::answering("unused"));
        let Html(body) = index(State(state(&crew))).await.unwrap();

        assert!(body.contains("action=\"/research\""));
        assert!(body.contains("Run Research"));
    }

    #[tokio::test]
    async fn test_research_renders_newsletter() {
        let crew = Arc::new(RecordingCrew::answering("TSLA is trending up"));
        let (status, Html(body)) = research(State(state(&crew)), Form(ResearchForm::new("TSLA")))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Results of your research:"));
        assert!(body.contains("TSLA is trending up"));
        assert_eq!(crew.calls.lock().unwrap()[0].get("ticker"), Some("TSLA"));
    }

    #[tokio::test]
    async fn test_research_without_ticker() {
        let crew = Arc::new(RecordingCrew::answering("unused"));
        let (status, Html(body)) = research(State(state(&crew)), Form(ResearchForm::default()))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("Please fill the ticket"));
        assert!(crew.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_research_failure() {
        let crew = Arc::new(RecordingCrew::failing("rate limited"));
        let (status, Html(body)) = research(State(state(&crew)), Form(ResearchForm::new("AMD")))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("rate limited"));
    }

    #[test]
    fn test_router_builds() {
        let crew: Arc<dyn Kickoff> = Arc::new(RecordingCrew::answering("unused"));
        tokio_test::assert_ok!(router(crew));
    }
}
