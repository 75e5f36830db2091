// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Formatter
//!
//! A single LLM call with no tools that converts the supervisor's raw
//! output into the user-facing reply. The prompt is built from four
//! composable sections; chatbot authors typically override tone, format,
//! or extra and leave the core alone. The engine bounds the call with the
//! formatter timeout and falls back to the raw results on expiry.

use std::sync::Arc;

use crate::config::Settings;
use crate::error::Result;
use crate::llm::client::ModelClient;
use crate::llm::message::Message;
use crate::llm::provider::ModelRequest;
use crate::prompts::{FORMATTER_CORE, FORMATTER_EXTRA, FORMATTER_FORMAT, FORMATTER_TONE};

/// The four composable formatter prompt sections
#[derive(Debug, Clone)]
pub struct FormatterSections {
    /// Synthesize and present naturally (rarely customized)
    pub core: String,
    /// Voice and style
    pub tone: String,
    /// Output structure
    pub format: String,
    /// Domain-specific additions
    pub extra: String,
}

impl Default for FormatterSections {
    fn default() -> Self {
        Self {
            core: FORMATTER_CORE.to_string(),
            tone: FORMATTER_TONE.to_string(),
            format: FORMATTER_FORMAT.to_string(),
            extra: FORMATTER_EXTRA.to_string(),
        }
    }
}

impl FormatterSections {
    /// Override the core section
    pub fn with_core(mut self, core: impl Into<String>) -> Self {
        self.core = core.into();
        self
    }

    /// Override the tone section
    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    /// Override the format section
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Override the extra section
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Join the non-empty sections into the system prompt
    pub fn system_prompt(&self) -> String {
        [&self.core, &self.tone, &self.format, &self.extra]
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// The formatter node: one model call, no tools
pub struct Formatter {
    client: Arc<ModelClient>,
    settings: Arc<Settings>,
    sections: FormatterSections,
}

impl Formatter {
    /// Create a formatter with default sections
    pub fn new(client: Arc<ModelClient>, settings: Arc<Settings>) -> Self {
        Self {
            client,
            settings,
            sections: FormatterSections::default(),
        }
    }

    /// Replace the prompt sections
    pub fn with_sections(mut self, sections: FormatterSections) -> Self {
        self.sections = sections;
        self
    }

    /// Produce the polished reply from the supervisor's raw output
    ///
    /// `history` supplies conversational context; the raw results are
    /// passed only inside this call and never enter the history.
    pub async fn format(
        &self,
        user_query: &str,
        agent_results: &str,
        history: &[Message],
    ) -> Result<String> {
        let mut messages = history.to_vec();
        messages.push(Message::user(format!(
            "User question: {}\n\nInformation gathered:\n{}",
            user_query, agent_results
        )));

        let request = ModelRequest::new(self.settings.llm_model.clone(), messages)
            .with_system(self.sections.system_prompt())
            .with_temperature(self.settings.llm_temperature)
            .with_reasoning_effort(self.settings.reasoning_effort())
            .with_timeout(self.settings.llm_request_timeout());

        Ok(self.client.complete(&request).await?.text())
    }
}
