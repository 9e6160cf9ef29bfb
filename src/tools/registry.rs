//! Capability registry - explicit mapping from tool name to handler
//!
//! The set of capabilities is closed (`Capability`); a registry binds a
//! handler to each capability it supports. Names that do not resolve yield
//! `Resolution::Unregistered` instead of being skipped silently.

use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::types::ToolDefinition;
use crate::error::{Error, Result};

use super::traits::Tool;

/// Capabilities the agent knows how to advertise and dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Web search (Tavily)
    WebSearch,
}

impl Capability {
    /// Every known capability, in advertisement order
    pub const ALL: [Capability; 1] = [Capability::WebSearch];

    /// The fixed name the model uses to request this capability
    pub const fn name(self) -> &'static str {
        match self {
            Capability::WebSearch => "tavily_search_results_json",
        }
    }

    /// Resolve a requested tool name to a capability
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of resolving a requested tool name
pub enum Resolution<'a> {
    /// A handler is registered for this capability
    Registered {
        capability: Capability,
        tool: &'a dyn Tool,
    },
    /// No handler is registered under the requested name
    Unregistered,
}

/// Registry of capability handlers
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<Capability, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under the capability its name identifies
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        let capability = Capability::from_name(tool.name()).ok_or_else(|| {
            Error::Config(format!("'{}' is not a known capability", tool.name()))
        })?;
        self.tools.insert(capability, Arc::new(tool));
        Ok(())
    }

    /// Builder-style registration
    pub fn with<T: Tool + 'static>(mut self, tool: T) -> Result<Self> {
        self.register(tool)?;
        Ok(self)
    }

    /// Resolve a requested tool name
    pub fn resolve(&self, name: &str) -> Resolution<'_> {
        match Capability::from_name(name)
            .and_then(|c| self.tools.get(&c).map(|tool| (c, tool)))
        {
            Some((capability, tool)) => Resolution::Registered {
                capability,
                tool: tool.as_ref(),
            },
            None => Resolution::Unregistered,
        }
    }

    /// Tool definitions advertised to the model, in capability order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        Capability::ALL
            .iter()
            .filter_map(|c| self.tools.get(c))
            .map(|t| t.to_definition())
            .collect()
    }

    /// Get tool count
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Registered capabilities, in capability order
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.tools.contains_key(c))
            .collect()
    }
}
