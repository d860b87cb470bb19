//! Tool management for crew agents
//!
//! Tools are the functions an agent's LLM may call: the stock-price fetcher,
//! the news search, and the coworker delegation tools the crew runtime adds.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::Tool;
