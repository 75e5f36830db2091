// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat engine
//!
//! Runs the fixed two-node graph for each turn: supervisor under the
//! supervisor timeout, then formatter under the formatter timeout with a
//! raw-results fallback. Exactly one assistant message is appended per
//! turn; the supervisor's raw output never enters the history. Errors are
//! translated to a single user-visible message with full detail logged.
//! Turns within a session run strictly sequentially.

pub mod progress;
pub mod state;

pub use progress::{ProgressEvent, ProgressSink};
pub use state::{ChatbotState, WorkflowStep};

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{error, info};

use crate::agents::formatter::{Formatter, FormatterSections};
use crate::agents::registry::AgentRegistry;
use crate::agents::runner::{AgentRun, AgentRuntime};
use crate::agents::supervisor::SupervisorBuilder;
use crate::config::Settings;
use crate::error::{ApiError, MaestroError};
use crate::knowledge::KnowledgeStore;
use crate::llm::client::ModelClient;
use crate::llm::message::Message;
use crate::middleware::{Middleware, Summarizer};

/// The orchestration engine for one chatbot process
pub struct ChatEngine {
    settings: Arc<Settings>,
    registry: Arc<AgentRegistry>,
    runtime: AgentRuntime,
    builder: SupervisorBuilder,
    formatter: Formatter,
    summarizer: Option<Summarizer>,
}

impl ChatEngine {
    /// Create an engine
    pub fn new(
        client: Arc<ModelClient>,
        settings: Arc<Settings>,
        registry: Arc<AgentRegistry>,
    ) -> Self {
        let summarizer = settings
            .summarization_enabled
            .then(|| Summarizer::from_settings(Arc::clone(&client), &settings));
        Self {
            runtime: AgentRuntime::new(Arc::clone(&client), Arc::clone(&settings)),
            builder: SupervisorBuilder::new(Arc::clone(&client), Arc::clone(&settings)),
            formatter: Formatter::new(Arc::clone(&client), Arc::clone(&settings)),
            summarizer,
            settings,
            registry,
        }
    }

    /// Attach a knowledge store for specialist read tools and inventory
    pub fn with_knowledge(mut self, store: Arc<KnowledgeStore>) -> Self {
        self.builder = self.builder.with_knowledge(store);
        self
    }

    /// Attach additional middlewares
    pub fn with_custom_middleware(mut self, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        self.builder = self.builder.with_custom_middleware(middleware);
        self
    }

    /// Override the formatter prompt sections
    pub fn with_formatter_sections(mut self, sections: FormatterSections) -> Self {
        self.formatter = self.formatter.with_sections(sections);
        self
    }

    /// The agent registry backing this engine
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// The effective settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run one turn through supervisor and formatter
    ///
    /// Always leaves the state consistent: exactly one assistant message
    /// is appended carrying the user-visible reply (formatted, raw
    /// fallback, or translated error).
    pub async fn run_turn(&self, state: &mut ChatbotState, query: &str, progress: &ProgressSink) {
        // Summarization boundary: the only place a history prefix may be
        // replaced, before the turn's user message lands.
        if let Some(summarizer) = &self.summarizer {
            if summarizer.over_trigger(&state.messages) {
                if let Err(e) = summarizer.compact(&mut state.messages).await {
                    error!("history summarization failed: {}", e);
                }
            }
        }

        state.begin_turn(query);
        let history: Vec<Message> = state.messages[..state.messages.len() - 1].to_vec();

        // Supervisor node, bounded by the supervisor timeout; every nested
        // specialist call and its tools run within this bound.
        let supervisor_run = AgentRun {
            agent_name: "supervisor".to_string(),
            system_prompt: self.builder.build_prompt(&self.registry),
            tools: match self.builder.build_tools(&self.registry, progress) {
                Ok(tools) => tools,
                Err(e) => {
                    self.fail_turn(state, progress, &e).await;
                    return;
                }
            },
            middleware: self.builder.supervisor_chain(),
            recursion_limit: self.settings.recursion_limit,
        };

        let supervisor_result = timeout(
            self.settings.supervisor_timeout(),
            self.runtime.run(&supervisor_run, query, &history, progress),
        )
        .await;

        let outcome = match supervisor_result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                self.fail_turn(state, progress, &e).await;
                return;
            }
            Err(_) => {
                let e = MaestroError::SupervisorTimeout(self.settings.supervisor_timeout);
                self.fail_turn(state, progress, &e).await;
                return;
            }
        };

        state.agent_results = outcome.response.clone();
        state.workflow_step = WorkflowStep::Formatter;
        info!(
            tools_used = outcome.tools_used.len(),
            steps = outcome.metadata.steps,
            "supervisor completed"
        );

        // Formatter node; raw results are the fallback on timeout or error.
        let reply = match timeout(
            self.settings.formatter_timeout(),
            self.formatter
                .format(query, &state.agent_results, &history),
        )
        .await
        {
            Ok(Ok(formatted)) => formatted,
            Ok(Err(e)) => {
                error!("formatter failed, returning raw results: {}", e);
                state.agent_results.clone()
            }
            Err(_) => {
                error!(
                    "formatter timed out after {:.1}s, returning raw results",
                    self.settings.formatter_timeout
                );
                state.agent_results.clone()
            }
        };

        // Exactly one assistant message per turn; raw agent_results are
        // discarded after formatting.
        state.chatbot_response = reply.clone();
        state.messages.push(Message::assistant(reply.clone()));
        state.workflow_step = WorkflowStep::Complete;
        progress.final_text(reply).await;
    }

    async fn fail_turn(
        &self,
        state: &mut ChatbotState,
        progress: &ProgressSink,
        err: &MaestroError,
    ) {
        error!("turn failed: {}", err);
        let message = translate_error(err);
        state.chatbot_response = message.clone();
        state.messages.push(Message::assistant(message.clone()));
        state.workflow_step = WorkflowStep::Error;
        progress.error(message).await;
    }
}

/// Map an internal error to the single user-visible message
pub fn translate_error(err: &MaestroError) -> String {
    match err {
        MaestroError::Api(ApiError::RateLimited(_)) => {
            "API rate limit reached; please retry in a moment.".to_string()
        }
        MaestroError::Api(ApiError::Timeout) | MaestroError::SupervisorTimeout(_) => {
            "The request took too long; try a narrower query.".to_string()
        }
        MaestroError::RecursionExceeded { .. } => {
            "The request required too many steps; please simplify.".to_string()
        }
        _ => "An error occurred while processing your request.".to_string(),
    }
}
