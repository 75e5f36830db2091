// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Model client
//!
//! Thin wrapper over an [`LlmProvider`] that enforces the per-call request
//! timeout and applies the engine's recovery policy (one jittered retry on
//! rate limits). Cancellation propagates: dropping the future aborts the
//! in-flight HTTP request.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::llm::message::Message;
use crate::llm::provider::{CompletionResponse, LlmProvider, ModelRequest};
use crate::llm::retry::{with_retry, RetryConfig};

/// Client for invoking the configured LLM provider
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn LlmProvider>,
    retry: RetryConfig,
}

impl ModelClient {
    /// Create a new client around a provider
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            retry: RetryConfig::default(),
        }
    }

    /// Create a client with a custom retry configuration
    pub fn with_retry_config(provider: Arc<dyn LlmProvider>, retry: RetryConfig) -> Self {
        Self { provider, retry }
    }

    /// The underlying provider name
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Invoke the model once, returning the raw completion
    ///
    /// Enforces `request.timeout` around the provider call; expiry maps to
    /// [`ApiError::Timeout`].
    pub async fn complete(&self, request: &ModelRequest) -> Result<CompletionResponse> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "model call"
        );

        with_retry(
            || async {
                match timeout(request.timeout, self.provider.complete(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(ApiError::Timeout.into()),
                }
            },
            self.retry.clone(),
            "model call",
        )
        .await
    }

    /// Invoke the model and convert the completion into an assistant message
    pub async fn invoke(&self, request: &ModelRequest) -> Result<Message> {
        Ok(self.complete(request).await?.into_message())
    }

    /// Count tokens using the provider's tokenizer (byte heuristic fallback)
    pub fn count_tokens(&self, text: &str) -> u32 {
        self.provider.count_tokens(text)
    }
}
