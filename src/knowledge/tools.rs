// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Knowledge reader tools
//!
//! `read_skill` and `read_fact` are the only knowledge tools exposed to
//! agents. There is no listing tool: the top-level inventory is injected
//! into the system prompt by the tool-instructions middleware, and
//! subdirectory documents are reachable only by explicit path.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{MaestroError, Result};
use crate::knowledge::store::{Category, KnowledgeStore};
use crate::llm::provider::ToolDefinition;
use crate::tools::{SchemaBuilder, Tool};

pub const READ_SKILL_TOOL: &str = "read_skill";
pub const READ_FACT_TOOL: &str = "read_fact";

/// Tool that reads a skill document by relative path
pub struct ReadSkillTool {
    store: Arc<KnowledgeStore>,
}

impl ReadSkillTool {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ReadSkillTool {
    fn name(&self) -> &str {
        READ_SKILL_TOOL
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: READ_SKILL_TOOL.to_string(),
            description: "Retrieve step-by-step instructions for performing a task. \
                          Pass the path shown in the skills inventory, e.g. 'deploy.md', \
                          or a referenced sub-document like 'deploy/frontend.md'."
                .to_string(),
            input_schema: SchemaBuilder::new()
                .string("path", "Path relative to the skills directory", true)
                .build(),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String> {
        read_category(&self.store, Category::Skills, &arguments)
    }
}

/// Tool that reads a fact document by relative path
pub struct ReadFactTool {
    store: Arc<KnowledgeStore>,
}

impl ReadFactTool {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ReadFactTool {
    fn name(&self) -> &str {
        READ_FACT_TOOL
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: READ_FACT_TOOL.to_string(),
            description: "Retrieve reference data (names, policies, configurations). \
                          Pass the path shown in the facts inventory, e.g. 'regions.md'."
                .to_string(),
            input_schema: SchemaBuilder::new()
                .string("path", "Path relative to the facts directory", true)
                .build(),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String> {
        read_category(&self.store, Category::Facts, &arguments)
    }
}

fn read_category(store: &KnowledgeStore, category: Category, arguments: &Value) -> Result<String> {
    let path = arguments["path"]
        .as_str()
        .ok_or_else(|| MaestroError::InvalidInput("path is required".to_string()))?;
    store.read(category, path)
}

/// Build the knowledge tools available for a package directory
///
/// Only categories that exist on disk produce a tool, so a skills-only
/// package exposes `read_skill` alone.
pub fn knowledge_tools(store: Arc<KnowledgeStore>) -> Vec<Arc<dyn Tool>> {
    let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
    if store.has_category(Category::Skills) {
        tools.push(Arc::new(ReadSkillTool::new(Arc::clone(&store))));
    }
    if store.has_category(Category::Facts) {
        tools.push(Arc::new(ReadFactTool::new(store)));
    }
    tools
}
