// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Prompt debug middleware
//!
//! Development-only: logs the final model request before each call and the
//! response after it, truncated per field, at INFO level to the application
//! log (never the user channel). Tool-call arguments are logged verbatim
//! and may contain credentials; keep this off outside development.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::llm::provider::{CompletionResponse, ModelRequest};
use crate::middleware::Middleware;

/// Middleware that logs prompts and responses when debugging
pub struct PromptDebugMiddleware {
    max_length: usize,
    show_response: bool,
}

impl PromptDebugMiddleware {
    /// Create the middleware with a per-field truncation limit
    pub fn new(max_length: usize, show_response: bool) -> Self {
        Self {
            max_length,
            show_response,
        }
    }
}

#[async_trait]
impl Middleware for PromptDebugMiddleware {
    fn name(&self) -> &str {
        "prompt_debug"
    }

    async fn before_model(&self, request: &mut ModelRequest) -> Result<()> {
        info!(
            model = %request.model,
            system = %truncate(request.system.as_deref().unwrap_or(""), self.max_length),
            "prompt debug: request"
        );
        for (i, message) in request.messages.iter().enumerate() {
            info!(
                index = i,
                role = %message.role,
                content = %truncate(&message.text_content(), self.max_length),
                "prompt debug: message"
            );
            for call in message.tool_calls() {
                info!(
                    index = i,
                    tool = call.name,
                    arguments = %truncate(&call.arguments.to_string(), self.max_length),
                    "prompt debug: tool call"
                );
            }
        }
        Ok(())
    }

    async fn after_model(&self, _request: &ModelRequest, response: &CompletionResponse) {
        if self.show_response {
            info!(
                text = %truncate(&response.text(), self.max_length),
                tool_calls = response.has_tool_calls(),
                "prompt debug: response"
            );
        }
    }
}

/// Truncate on a character boundary, marking elided content
fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_length).collect();
    format!("{}... [truncated]", truncated)
}
