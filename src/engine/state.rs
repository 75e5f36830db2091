// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chatbot state
//!
//! The value flowing through the two-node graph for one turn. Messages are
//! append-only except at summarization boundaries; `workflow_step`
//! transitions only Supervisor → Formatter → Complete, or to Error from
//! any state; `agent_results` is set exactly once before the formatter
//! runs.

use crate::llm::message::Message;

/// Position of the current turn in the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    /// Supervisor node is running
    Supervisor,
    /// Formatter node is running
    Formatter,
    /// The turn finished
    Complete,
    /// The turn failed
    Error,
}

/// The state threaded through one session
#[derive(Debug, Clone)]
pub struct ChatbotState {
    /// Conversation history across turns
    pub messages: Vec<Message>,
    /// Current turn's input (redundant with the last user message)
    pub user_query: String,
    /// Supervisor's raw output, prior to formatting
    pub agent_results: String,
    /// Final user-visible reply
    pub chatbot_response: String,
    /// Current workflow position
    pub workflow_step: WorkflowStep,
}

impl Default for ChatbotState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatbotState {
    /// Fresh session state
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            user_query: String::new(),
            agent_results: String::new(),
            chatbot_response: String::new(),
            workflow_step: WorkflowStep::Complete,
        }
    }

    /// Start a turn: record the query, append the user message, reset
    /// per-turn fields
    pub fn begin_turn(&mut self, query: &str) {
        self.user_query = query.to_string();
        self.agent_results.clear();
        self.chatbot_response.clear();
        self.messages.push(Message::user(query));
        self.workflow_step = WorkflowStep::Supervisor;
    }
}
