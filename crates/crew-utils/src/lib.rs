//! Shared utilities for the crew workspace
//!
//! Logging setup and the small amount of configuration every binary in the
//! workspace needs before anything else runs.

pub mod config;
pub mod logging;

pub use config::{Config, LogFormat};
pub use logging::init_tracing;
