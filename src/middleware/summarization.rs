// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation summarization
//!
//! When the estimated token count of the message list exceeds the trigger,
//! the prefix before the last K messages is compressed into a single system
//! synopsis message produced by a short LLM call. The synopsis carries a
//! marker so repeated summarization composes (summary-of-summary) instead
//! of re-compressing already-summarized content.
//!
//! The token count uses the provider tokenizer with a bytes/4 fallback;
//! it is approximate and only ever a trigger, never a hard bound.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::Settings;
use crate::error::Result;
use crate::llm::client::ModelClient;
use crate::llm::message::Message;
use crate::llm::provider::{ModelRequest, ReasoningEffort};
use crate::middleware::Middleware;
use crate::prompts::{SUMMARIZER_PROMPT, SUMMARY_MARKER};

/// Compresses conversation prefixes via a compact LLM call
#[derive(Clone)]
pub struct Summarizer {
    client: Arc<ModelClient>,
    model: String,
    trigger_tokens: u32,
    keep_messages: usize,
    request_timeout: Duration,
}

impl Summarizer {
    /// Build a summarizer from settings
    pub fn from_settings(client: Arc<ModelClient>, settings: &Settings) -> Self {
        Self {
            client,
            model: settings.llm_model.clone(),
            trigger_tokens: settings.summarization_trigger_tokens,
            keep_messages: settings.summarization_keep_messages,
            request_timeout: settings.llm_request_timeout(),
        }
    }

    /// Build a summarizer with explicit parameters (tests)
    pub fn new(
        client: Arc<ModelClient>,
        model: impl Into<String>,
        trigger_tokens: u32,
        keep_messages: usize,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            trigger_tokens,
            keep_messages,
            request_timeout,
        }
    }

    /// Estimated token count for a message list
    pub fn estimate(&self, messages: &[Message]) -> u32 {
        messages
            .iter()
            .map(|m| self.client.count_tokens(&m.text_content()))
            .sum()
    }

    /// Whether the message list exceeds the trigger
    pub fn over_trigger(&self, messages: &[Message]) -> bool {
        self.estimate(messages) > self.trigger_tokens
    }

    /// Compress the prefix before the last K messages into one synopsis
    ///
    /// Returns true when a replacement happened. With `keep_messages = 0`
    /// the entire list is summarized and only the synopsis survives.
    pub async fn compact(&self, messages: &mut Vec<Message>) -> Result<bool> {
        if messages.len() <= self.keep_messages || messages.is_empty() {
            return Ok(false);
        }

        let split = messages.len() - self.keep_messages;
        let prefix = &messages[..split];
        let tail = messages[split..].to_vec();

        let transcript = render_transcript(prefix);
        let request = ModelRequest::new(self.model.clone(), vec![Message::user(transcript)])
            .with_system(SUMMARIZER_PROMPT)
            .with_temperature(0.0)
            .with_reasoning_effort(ReasoningEffort::Low)
            .with_timeout(self.request_timeout);

        let synopsis = self.client.complete(&request).await?.text();
        debug!(
            replaced = split,
            kept = tail.len(),
            "summarized conversation prefix"
        );

        let mut replacement =
            vec![Message::system(format!("{} {}", SUMMARY_MARKER, synopsis.trim()))];
        replacement.extend(tail);
        *messages = replacement;
        Ok(true)
    }
}

/// Render messages as a plain transcript for the summarizer call
fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.text_content()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Middleware form: compacts the request's message list when over trigger
pub struct SummarizationMiddleware {
    summarizer: Summarizer,
}

impl SummarizationMiddleware {
    pub fn new(summarizer: Summarizer) -> Self {
        Self { summarizer }
    }
}

#[async_trait]
impl Middleware for SummarizationMiddleware {
    fn name(&self) -> &str {
        "summarization"
    }

    async fn before_model(&self, request: &mut ModelRequest) -> Result<()> {
        if self.summarizer.over_trigger(&request.messages) {
            self.summarizer.compact(&mut request.messages).await?;
        }
        Ok(())
    }
}
