// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Core types for the agent system

use std::sync::Arc;

use crate::error::{MaestroError, Result};
use crate::tools::Tool;

/// A registered agent: name, capabilities, and its tools
///
/// One capabilities string serves both as the agent's own base system
/// prompt and as the routing cue in the supervisor's capabilities section.
#[derive(Clone)]
pub struct AgentDefinition {
    /// Unique process-wide identifier (identifier characters only)
    pub name: String,
    /// Free-text description of what the agent can do
    pub capabilities: String,
    /// Tools available to this agent
    pub tools: Vec<Arc<dyn Tool>>,
}

impl AgentDefinition {
    /// Create an agent definition
    pub fn new(
        name: impl Into<String>,
        capabilities: impl Into<String>,
        tools: Vec<Arc<dyn Tool>>,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities: capabilities.into(),
            tools,
        }
    }

    /// Validate the agent name (identifier characters, non-empty, no
    /// leading digit)
    pub fn validate_name(name: &str) -> Result<()> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !name.starts_with(|c: char| c.is_ascii_digit());
        if valid {
            Ok(())
        } else {
            Err(MaestroError::InvalidInput(format!(
                "invalid agent name '{}': use identifier characters only",
                name
            )))
        }
    }

    /// Tool names in registration order
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

impl std::fmt::Debug for AgentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDefinition")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("tools", &self.tool_names())
            .finish()
    }
}

/// Result of one agent invocation
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// The agent's final text
    pub response: String,
    /// Which agent produced it
    pub agent_name: String,
    /// Tools invoked during the run, in execution order
    pub tools_used: Vec<String>,
    /// Run metadata
    pub metadata: AgentMetadata,
}

/// Metadata about an agent run
#[derive(Debug, Clone, Default)]
pub struct AgentMetadata {
    /// Tool-loop iterations consumed
    pub steps: u32,
    /// Whether the run was cut off by a timeout
    pub timed_out: bool,
}

impl AgentOutcome {
    /// A completed outcome
    pub fn completed(
        agent_name: impl Into<String>,
        response: impl Into<String>,
        tools_used: Vec<String>,
        steps: u32,
    ) -> Self {
        Self {
            response: response.into(),
            agent_name: agent_name.into(),
            tools_used,
            metadata: AgentMetadata {
                steps,
                timed_out: false,
            },
        }
    }

    /// A truncated outcome for a run cut off by its timeout
    ///
    /// The response is a string the parent model can see and recover from.
    pub fn timed_out(agent_name: impl Into<String>, timeout_secs: f64) -> Self {
        let agent_name = agent_name.into();
        Self {
            response: format!(
                "The {} agent timed out after {:.0}s before completing; no result is available.",
                agent_name, timeout_secs
            ),
            agent_name,
            tools_used: Vec::new(),
            metadata: AgentMetadata {
                steps: 0,
                timed_out: true,
            },
        }
    }
}
