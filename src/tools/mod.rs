//! Tools module - the capability the agent can invoke
//!
//! A tool implements the `Tool` trait and is bound to a `Capability` in a
//! `ToolRegistry`. The registry is what the reasoner advertises to the model
//! and what the tool executor dispatches through.
//!
//! ## Built-in Tools
//!
//! - **tavily_search_results_json**: Tavily web search (requires API key)

mod registry;
mod tavily_search;
mod traits;

// Core trait and types
pub use traits::{Tool, ToolResult};

// Registry
pub use registry::{Capability, Resolution, ToolRegistry};

// Built-in tools
pub use tavily_search::{SearchResult, TavilySearchTool};
