// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock LLM provider for testing
//!
//! Provides a configurable mock implementation of the LlmProvider trait
//! that can be used in unit and integration tests without real API calls.
//! Responses are returned in queue order; the last response repeats.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::llm::provider::{
    CompletionResponse, ContentBlockResponse, LlmProvider, ModelRequest, StopReason, Usage,
};

/// A mock LLM provider for testing
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    responses: Arc<Mutex<Vec<MockResponse>>>,
    call_count: Arc<AtomicUsize>,
    recorded_requests: Arc<Mutex<Vec<ModelRequest>>>,
    delay: Option<Duration>,
    rate_limit_failures: Arc<AtomicUsize>,
}

/// A pre-configured response for the mock provider
#[derive(Clone, Debug, Default)]
pub struct MockResponse {
    /// Text content to return
    pub text: String,
    /// Tool calls to return (optional)
    pub tool_calls: Vec<MockToolCall>,
}

/// A mock tool call
#[derive(Clone, Debug)]
pub struct MockToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider with a single default response
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            responses: Arc::new(Mutex::new(vec![MockResponse {
                text: "Mock response".to_string(),
                ..Default::default()
            }])),
            call_count: Arc::new(AtomicUsize::new(0)),
            recorded_requests: Arc::new(Mutex::new(vec![])),
            delay: None,
            rate_limit_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the queue with a single text response
    pub fn with_response(self, text: impl Into<String>) -> Self {
        {
            let mut responses = self.responses.lock().unwrap();
            responses.clear();
            responses.push(MockResponse {
                text: text.into(),
                ..Default::default()
            });
        }
        self
    }

    /// Replace the queue with multiple text responses (returned in order)
    pub fn with_responses(self, texts: Vec<String>) -> Self {
        {
            let mut responses = self.responses.lock().unwrap();
            responses.clear();
            for text in texts {
                responses.push(MockResponse {
                    text,
                    ..Default::default()
                });
            }
        }
        self
    }

    /// Replace the queue with explicit scripted responses
    pub fn with_script(self, script: Vec<MockResponse>) -> Self {
        {
            let mut responses = self.responses.lock().unwrap();
            *responses = script;
        }
        self
    }

    /// Replace the queue with a single tool-call response
    pub fn with_tool_call(self, name: impl Into<String>, input: serde_json::Value) -> Self {
        self.with_script(vec![MockResponse::tool_call(name, input)])
    }

    /// Add artificial latency before each completion (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the first N completions with a rate-limit error
    pub fn with_rate_limit_failures(self, count: usize) -> Self {
        self.rate_limit_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get all recorded requests
    pub fn recorded_requests(&self) -> Vec<ModelRequest> {
        self.recorded_requests.lock().unwrap().clone()
    }

    /// Get the last request made
    pub fn last_request(&self) -> Option<ModelRequest> {
        self.recorded_requests.lock().unwrap().last().cloned()
    }

    fn next_response(&self) -> MockResponse {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            MockResponse::default()
        } else {
            responses[count.min(responses.len() - 1)].clone()
        }
    }
}

impl MockResponse {
    /// A plain text response
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: vec![],
        }
    }

    /// A single tool-call response
    pub fn tool_call(name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            text: String::new(),
            tool_calls: vec![MockToolCall {
                id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                name: name.into(),
                input,
            }],
        }
    }

    /// A multi-tool-call response with fixed call ids
    pub fn tool_calls(calls: Vec<(&str, &str, serde_json::Value)>) -> Self {
        Self {
            text: String::new(),
            tool_calls: calls
                .into_iter()
                .map(|(id, name, input)| MockToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    input,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &ModelRequest) -> Result<CompletionResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.recorded_requests.lock().unwrap().push(request.clone());

        let remaining = self.rate_limit_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.rate_limit_failures
                .store(remaining - 1, Ordering::SeqCst);
            self.call_count.fetch_add(1, Ordering::SeqCst);
            return Err(ApiError::RateLimited(1).into());
        }

        let response = self.next_response();

        let mut content = vec![];
        if !response.text.is_empty() {
            content.push(ContentBlockResponse::Text {
                text: response.text,
            });
        }
        let has_tools = !response.tool_calls.is_empty();
        for tool_call in response.tool_calls {
            content.push(ContentBlockResponse::ToolUse {
                id: tool_call.id,
                name: tool_call.name,
                input: tool_call.input,
            });
        }

        Ok(CompletionResponse {
            id: format!("msg_{}", uuid::Uuid::new_v4().simple()),
            model: request.model.clone(),
            content,
            stop_reason: Some(if has_tools {
                StopReason::ToolUse
            } else {
                StopReason::EndTurn
            }),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
            },
        })
    }
}
