//! Prompt templates for crew agents
//!
//! Agent roles, goals, backstories and task descriptions are written as
//! templates with `{{ placeholder }}` slots that are filled from the crew's
//! kickoff inputs. A placeholder with no matching input is an error rather
//! than an empty string, so a typo in an input name fails loudly.
//!
//! # Quick Start
//!
//! ```
//! use crew_prompt::{PromptBuilder, PromptTemplate};
//! use serde_json::json;
//!
//! let goal = PromptTemplate::new("goal", "Find the {{ ticker }} stock price").unwrap();
//! let rendered = goal.render(&json!({ "ticker": "AAPL" })).unwrap();
//! assert_eq!(rendered, "Find the AAPL stock price");
//!
//! let prompt = PromptBuilder::new()
//!     .text(rendered)
//!     .section("Context")
//!     .bullet("trend: up")
//!     .build();
//! assert!(prompt.contains("## Context"));
//! ```

mod builder;
mod error;
mod template;

pub use builder::PromptBuilder;
pub use error::{PromptError, Result};
pub use template::PromptTemplate;
