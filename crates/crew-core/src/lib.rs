//! Core abstractions for the crew workspace
//!
//! This crate defines the fundamental traits and types shared by the LLM,
//! tool and runtime crates.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::Context;
pub use error::{Error, Result};
