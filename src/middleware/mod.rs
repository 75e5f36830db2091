// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Middleware pipeline
//!
//! Middlewares mutate the model request before every LLM call and may
//! observe the response afterwards. The chain runs `before_model` in
//! registration order and `after_model` in reverse order, so the first
//! registered middleware is outermost.
//!
//! The engine mandates the standard order: datetime context, tool
//! instructions, custom middlewares, summarization, prompt debug.

pub mod datetime_context;
pub mod prompt_debug;
pub mod summarization;
pub mod tool_instructions;

pub use datetime_context::{DatetimeContextMiddleware, DatetimeMode};
pub use prompt_debug::PromptDebugMiddleware;
pub use summarization::{SummarizationMiddleware, Summarizer};
pub use tool_instructions::ToolInstructionsMiddleware;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::llm::provider::{CompletionResponse, ModelRequest};

/// A request-mutation hook applied around every LLM call
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Middleware name, for logging
    fn name(&self) -> &str;

    /// Mutate the request before it reaches the model
    async fn before_model(&self, request: &mut ModelRequest) -> Result<()>;

    /// Observe the response after the call
    async fn after_model(&self, _request: &ModelRequest, _response: &CompletionResponse) {}
}

/// An ordered middleware chain
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware to the chain
    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Build the engine-mandated chain for one agent
    ///
    /// `custom` middlewares run between tool instructions and
    /// summarization, in registration order.
    pub fn standard(
        datetime: Arc<dyn Middleware>,
        tool_instructions: Option<Arc<dyn Middleware>>,
        custom: Vec<Arc<dyn Middleware>>,
        summarization: Option<Arc<dyn Middleware>>,
        prompt_debug: Option<Arc<dyn Middleware>>,
    ) -> Self {
        let mut chain = Self::new();
        chain.push(datetime);
        if let Some(m) = tool_instructions {
            chain.push(m);
        }
        for m in custom {
            chain.push(m);
        }
        if let Some(m) = summarization {
            chain.push(m);
        }
        if let Some(m) = prompt_debug {
            chain.push(m);
        }
        chain
    }

    /// Number of middlewares in the chain
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Run all `before_model` hooks, in order
    pub async fn before(&self, request: &mut ModelRequest) -> Result<()> {
        for middleware in &self.middlewares {
            middleware.before_model(request).await?;
        }
        Ok(())
    }

    /// Run all `after_model` hooks, in reverse order
    pub async fn after(&self, request: &ModelRequest, response: &CompletionResponse) {
        for middleware in self.middlewares.iter().rev() {
            middleware.after_model(request, response).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::message::Message;
    use crate::llm::provider::{StopReason, Usage};
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Middleware for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        async fn before_model(&self, request: &mut ModelRequest) -> Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("before:{}", self.label));
            let system = request.system.take().unwrap_or_default();
            request.system = Some(format!("{}[{}]", system, self.label));
            Ok(())
        }

        async fn after_model(&self, _request: &ModelRequest, _response: &CompletionResponse) {
            self.log
                .lock()
                .unwrap()
                .push(format!("after:{}", self.label));
        }
    }

    fn response() -> CompletionResponse {
        CompletionResponse {
            id: "r".to_string(),
            model: "m".to_string(),
            content: vec![],
            stop_reason: Some(StopReason::EndTurn),
            usage: Usage::default(),
        }
    }

    #[tokio::test]
    async fn test_chain_runs_before_in_order_and_after_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(Recorder {
            label: "first",
            log: Arc::clone(&log),
        }));
        chain.push(Arc::new(Recorder {
            label: "second",
            log: Arc::clone(&log),
        }));

        let mut request = ModelRequest::new("m", vec![Message::user("q")]);
        chain.before(&mut request).await.unwrap();
        chain.after(&request, &response()).await;

        let entries = log.lock().unwrap().clone();
        assert_eq!(
            entries,
            vec!["before:first", "before:second", "after:second", "after:first"]
        );
        // Mutations compose in order
        assert_eq!(request.system.as_deref(), Some("[first][second]"));
    }

    #[tokio::test]
    async fn test_empty_chain_is_a_noop() {
        let chain = MiddlewareChain::new();
        assert!(chain.is_empty());

        let mut request = ModelRequest::new("m", vec![]);
        chain.before(&mut request).await.unwrap();
        assert!(request.system.is_none());
    }

    #[test]
    fn test_standard_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mk = |label: &'static str| -> Arc<dyn Middleware> {
            Arc::new(Recorder {
                label,
                log: Arc::clone(&log),
            })
        };

        let chain = MiddlewareChain::standard(
            mk("datetime"),
            Some(mk("tool_instructions")),
            vec![mk("custom")],
            Some(mk("summarization")),
            Some(mk("prompt_debug")),
        );
        assert_eq!(chain.len(), 5);

        let names: Vec<&str> = chain.middlewares.iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            vec![
                "datetime",
                "tool_instructions",
                "custom",
                "summarization",
                "prompt_debug"
            ]
        );
    }

    #[test]
    fn test_standard_with_optionals_absent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = MiddlewareChain::standard(
            Arc::new(Recorder {
                label: "datetime",
                log,
            }),
            None,
            vec![],
            None,
            None,
        );
        assert_eq!(chain.len(), 1);
    }
}
