// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Agent registry
//!
//! Process-wide mapping from agent name to agent definition. Writes happen
//! at startup (and rarely afterwards); reads dominate, so a read-write
//! lock suffices. Iteration order is insertion order, which keeps the
//! supervisor's capabilities section deterministic.

use std::sync::{Arc, RwLock};

use crate::agents::types::AgentDefinition;
use crate::error::{MaestroError, Result};

/// Registry of specialist agents
#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<Vec<Arc<AgentDefinition>>>,
}

impl AgentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent
    ///
    /// Fails with `DuplicateAgent` when the name exists, unless
    /// `overwrite` is set; overwriting keeps the agent's original position
    /// so listing order stays stable.
    pub fn register(&self, agent: AgentDefinition, overwrite: bool) -> Result<()> {
        AgentDefinition::validate_name(&agent.name)?;

        let mut agents = self.agents.write().unwrap();
        if let Some(existing) = agents.iter_mut().find(|a| a.name == agent.name) {
            if !overwrite {
                return Err(MaestroError::DuplicateAgent(agent.name));
            }
            *existing = Arc::new(agent);
        } else {
            agents.push(Arc::new(agent));
        }
        Ok(())
    }

    /// Remove an agent by name; returns whether it existed
    pub fn unregister(&self, name: &str) -> bool {
        let mut agents = self.agents.write().unwrap();
        let before = agents.len();
        agents.retain(|a| a.name != name);
        agents.len() != before
    }

    /// Get an agent by name
    pub fn get(&self, name: &str) -> Option<Arc<AgentDefinition>> {
        self.agents
            .read()
            .unwrap()
            .iter()
            .find(|a| a.name == name)
            .cloned()
    }

    /// All registered agents, in insertion order
    pub fn get_all(&self) -> Vec<Arc<AgentDefinition>> {
        self.agents.read().unwrap().clone()
    }

    /// Whether an agent name is registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of registered agents
    pub fn len(&self) -> usize {
        self.agents.read().unwrap().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
