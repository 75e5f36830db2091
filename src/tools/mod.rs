// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool system for Maestro
//!
//! A tool is a named, schema-described capability an agent may invoke.
//! Tool authors construct tools explicitly, either by implementing the
//! [`Tool`] trait or with [`FnTool`] around an async closure, and agent
//! authors hand the engine a list of them. Handlers return a string result;
//! unrecoverable failures surface as errors and are stringified into the
//! conversation so the model can recover.

pub mod definition;

pub use definition::{missing_required, SchemaBuilder};

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{MaestroError, Result};
use crate::llm::provider::{ToolDefinition, ToolInputSchema};

/// Trait for implementing tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool definition for the LLM
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with validated arguments
    async fn execute(&self, arguments: Value) -> Result<String>;
}

type Handler =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<String>> + Send + Sync + 'static>;

/// A tool built from an explicit record plus an async closure
pub struct FnTool {
    name: String,
    description: String,
    input_schema: ToolInputSchema,
    handler: Handler,
}

impl FnTool {
    /// Create a new tool from its parts
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: ToolInputSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String> {
        (self.handler)(arguments).await
    }
}

/// Registry of the tools available to one agent
///
/// Definitions are reported in registration order so prompt material built
/// from them is deterministic.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from a tool list
    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool; a same-named tool is replaced
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if let Some(&i) = self.index.get(&name) {
            self.tools[i] = tool;
        } else {
            self.index.insert(name, self.tools.len());
            self.tools.push(tool);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Get all tool definitions, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// List tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate arguments against the tool's schema and execute it
    pub async fn execute(&self, name: &str, arguments: Value) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| MaestroError::ToolExecution(format!("Unknown tool: {}", name)))?;

        let missing = missing_required(&tool.definition().input_schema, &arguments);
        if !missing.is_empty() {
            return Err(MaestroError::InvalidInput(format!(
                "{}: missing required argument(s): {}",
                name,
                missing.join(", ")
            )));
        }

        tool.execute(arguments).await
    }
}
