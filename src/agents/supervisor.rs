// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Supervisor composition
//!
//! The supervisor is itself an agent: its system prompt is composed from
//! the base prompt, the registered specialists' capabilities (insertion
//! order, each entry prefixed by the agent name), and the planning block.
//! Its tools are one wrapper per registered agent; routing is driven by
//! the capabilities section, not per-tool descriptions, so wrapper
//! docstrings stay generic.
//!
//! Wrapper invocations get a fresh recursion counter and run under the
//! specialist timeout; a timeout produces a tool-result string the
//! supervisor model can see and recover from.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::timeout;

use crate::agents::registry::AgentRegistry;
use crate::agents::runner::{AgentRun, AgentRuntime};
use crate::agents::types::{AgentDefinition, AgentOutcome};
use crate::config::Settings;
use crate::engine::progress::ProgressSink;
use crate::error::{MaestroError, Result};
use crate::knowledge::KnowledgeStore;
use crate::llm::client::ModelClient;
use crate::llm::provider::ToolDefinition;
use crate::middleware::{
    DatetimeContextMiddleware, DatetimeMode, Middleware, MiddlewareChain, PromptDebugMiddleware,
    SummarizationMiddleware, Summarizer, ToolInstructionsMiddleware,
};
use crate::prompts::{
    agent_tool_description, CAPABILITIES_HEADING, PLANNING_PROMPT, SUPERVISOR_PROMPT,
};
use crate::tools::{SchemaBuilder, Tool, ToolRegistry};

/// Deterministic capabilities section from the registered agents
pub fn capabilities_section(agents: &[Arc<AgentDefinition>]) -> String {
    let mut section = format!("{}\n", CAPABILITIES_HEADING);
    if agents.is_empty() {
        section.push_str(
            "\n(none registered; answer directly from your own knowledge and the conversation)\n",
        );
        return section;
    }
    for agent in agents {
        section.push_str(&format!("\n### {}\n{}\n", agent.name, agent.capabilities));
    }
    section
}

/// System prompt for a specialist: capabilities plus the planning block
pub fn specialist_system_prompt(capabilities: &str) -> String {
    format!("{}\n\n{}", capabilities.trim_end(), PLANNING_PROMPT)
}

/// Composes the supervisor's prompt, tools, and middleware chains
pub struct SupervisorBuilder {
    client: Arc<ModelClient>,
    settings: Arc<Settings>,
    knowledge: Option<Arc<KnowledgeStore>>,
    custom_middleware: Vec<Arc<dyn Middleware>>,
    instruction_cache: Mutex<HashMap<String, Arc<dyn Middleware>>>,
}

impl SupervisorBuilder {
    /// Create a builder
    pub fn new(client: Arc<ModelClient>, settings: Arc<Settings>) -> Self {
        Self {
            client,
            settings,
            knowledge: None,
            custom_middleware: Vec::new(),
            instruction_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Attach the knowledge store backing specialist read tools
    pub fn with_knowledge(mut self, store: Arc<KnowledgeStore>) -> Self {
        self.knowledge = Some(store);
        self
    }

    /// Attach additional middlewares (run between tool instructions and
    /// summarization, in registration order)
    pub fn with_custom_middleware(mut self, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        self.custom_middleware = middleware;
        self
    }

    /// Compose the supervisor system prompt from the current registry
    ///
    /// Building twice against the same registry yields byte-identical
    /// output.
    pub fn build_prompt(&self, registry: &AgentRegistry) -> String {
        format!(
            "{}\n{}\n{}",
            SUPERVISOR_PROMPT,
            capabilities_section(&registry.get_all()),
            PLANNING_PROMPT
        )
    }

    /// Build the supervisor's wrapper tools for one turn
    pub fn build_tools(
        &self,
        registry: &AgentRegistry,
        progress: &ProgressSink,
    ) -> Result<ToolRegistry> {
        let mut tools = ToolRegistry::new();
        for agent in registry.get_all() {
            let chain = self.specialist_chain(&agent)?;
            tools.register(Arc::new(AgentTool {
                agent: Arc::clone(&agent),
                runtime: AgentRuntime::new(Arc::clone(&self.client), Arc::clone(&self.settings)),
                chain,
                recursion_limit: self.settings.recursion_limit_for(&agent.name),
                specialist_timeout: self.settings.specialist_timeout(),
                progress: progress.clone(),
            }));
        }
        Ok(tools)
    }

    /// Middleware chain for the supervisor (full datetime mode)
    pub fn supervisor_chain(&self) -> MiddlewareChain {
        MiddlewareChain::standard(
            Arc::new(DatetimeContextMiddleware::new(DatetimeMode::Full)),
            None,
            self.custom_middleware.clone(),
            self.summarization(),
            self.prompt_debug(),
        )
    }

    /// Middleware chain for one specialist (minimal datetime mode)
    fn specialist_chain(&self, agent: &AgentDefinition) -> Result<MiddlewareChain> {
        Ok(MiddlewareChain::standard(
            Arc::new(DatetimeContextMiddleware::new(DatetimeMode::Minimal)),
            self.tool_instructions_for(agent)?,
            self.custom_middleware.clone(),
            self.summarization(),
            self.prompt_debug(),
        ))
    }

    /// Per-agent tool-instructions middleware, cached for the process run
    ///
    /// The inventory is read once at first use; the cached instance is
    /// reused on every subsequent turn.
    fn tool_instructions_for(
        &self,
        agent: &AgentDefinition,
    ) -> Result<Option<Arc<dyn Middleware>>> {
        {
            let cache = self.instruction_cache.lock().unwrap();
            if let Some(cached) = cache.get(&agent.name) {
                return Ok(Some(Arc::clone(cached)));
            }
        }

        let middleware = ToolInstructionsMiddleware::new(
            agent.tool_names().into_iter(),
            self.knowledge.as_deref(),
        )?;
        if middleware.block().is_empty() {
            return Ok(None);
        }

        let middleware: Arc<dyn Middleware> = Arc::new(middleware);
        self.instruction_cache
            .lock()
            .unwrap()
            .insert(agent.name.clone(), Arc::clone(&middleware));
        Ok(Some(middleware))
    }

    fn summarization(&self) -> Option<Arc<dyn Middleware>> {
        if self.settings.summarization_enabled {
            Some(Arc::new(SummarizationMiddleware::new(
                Summarizer::from_settings(Arc::clone(&self.client), &self.settings),
            )))
        } else {
            None
        }
    }

    fn prompt_debug(&self) -> Option<Arc<dyn Middleware>> {
        if self.settings.debug {
            Some(Arc::new(PromptDebugMiddleware::new(
                self.settings.debug_prompt_max_length,
                self.settings.debug_show_response,
            )))
        } else {
            None
        }
    }
}

/// Wrapper tool exposing one specialist agent to the supervisor
pub struct AgentTool {
    agent: Arc<AgentDefinition>,
    runtime: AgentRuntime,
    chain: MiddlewareChain,
    recursion_limit: u32,
    specialist_timeout: Duration,
    progress: ProgressSink,
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.agent.name
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.agent.name.clone(),
            description: agent_tool_description(&self.agent.name),
            input_schema: SchemaBuilder::new()
                .string(
                    "query",
                    "Self-contained natural-language query for the agent",
                    true,
                )
                .build(),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| MaestroError::InvalidInput("query is required".to_string()))?;

        // Fresh step counter per invocation; the caller's consumption is
        // not inherited.
        let run = AgentRun {
            agent_name: self.agent.name.clone(),
            system_prompt: specialist_system_prompt(&self.agent.capabilities),
            tools: ToolRegistry::from_tools(self.agent.tools.clone()),
            middleware: self.chain.clone(),
            recursion_limit: self.recursion_limit,
        };

        match timeout(
            self.specialist_timeout,
            self.runtime.run(&run, query, &[], &self.progress),
        )
        .await
        {
            Ok(Ok(outcome)) => Ok(outcome.response),
            // Agent-level failures surface as tool errors; the runner
            // stringifies them for the supervisor model.
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(AgentOutcome::timed_out(
                &self.agent.name,
                self.specialist_timeout.as_secs_f64(),
            )
            .response),
        }
    }
}
