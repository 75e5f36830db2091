// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Agent runtime
//!
//! Executes one agent's tool loop: invoke the model, execute any requested
//! tools, feed the results back, repeat until the model answers in text or
//! the recursion limit trips. Tool calls within one assistant message run
//! concurrently, but their result messages are appended in the order of
//! the originating call list so a replayed conversation is deterministic.
//!
//! Recursion isolation: every invocation gets a fresh step counter. A
//! specialist called from a supervisor that has already consumed steps
//! still has its full limit available.

use std::sync::Arc;

use crate::agents::types::AgentOutcome;
use crate::config::Settings;
use crate::engine::progress::ProgressSink;
use crate::error::{MaestroError, Result};
use crate::llm::client::ModelClient;
use crate::llm::message::Message;
use crate::llm::provider::ModelRequest;
use crate::middleware::MiddlewareChain;
use crate::tools::ToolRegistry;

/// One agent's execution parameters for the runtime
pub struct AgentRun {
    /// Agent name (progress attribution, error messages)
    pub agent_name: String,
    /// Fully composed system prompt
    pub system_prompt: String,
    /// Tools available in the loop
    pub tools: ToolRegistry,
    /// Middleware applied around every model call
    pub middleware: MiddlewareChain,
    /// Step budget for this invocation
    pub recursion_limit: u32,
}

/// Executes agent tool loops against the model client
#[derive(Clone)]
pub struct AgentRuntime {
    client: Arc<ModelClient>,
    settings: Arc<Settings>,
}

impl AgentRuntime {
    /// Create a runtime
    pub fn new(client: Arc<ModelClient>, settings: Arc<Settings>) -> Self {
        Self { client, settings }
    }

    /// Run one agent invocation to completion
    ///
    /// `history` is prior conversation context; the query is appended as
    /// the current user message. Timeouts are the caller's concern: the
    /// specialist wrapper and the engine wrap this future in their
    /// respective bounds.
    pub async fn run(
        &self,
        run: &AgentRun,
        query: &str,
        history: &[Message],
        progress: &ProgressSink,
    ) -> Result<AgentOutcome> {
        progress.progress(&run.agent_name, "processing").await;

        let mut messages: Vec<Message> = history.to_vec();
        messages.push(Message::user(query));

        let tool_definitions = run.tools.definitions();
        let mut tools_used: Vec<String> = Vec::new();
        let mut steps: u32 = 0;

        loop {
            let mut request = ModelRequest::new(self.settings.llm_model.clone(), messages)
                .with_system(run.system_prompt.clone())
                .with_tools(tool_definitions.clone())
                .with_temperature(self.settings.llm_temperature)
                .with_reasoning_effort(self.settings.reasoning_effort())
                .with_timeout(self.settings.llm_request_timeout());

            run.middleware.before(&mut request).await?;
            let response = self.client.complete(&request).await?;
            run.middleware.after(&request, &response).await;

            // Middleware may have compacted the message list; adopt its view
            messages = request.messages;

            let assistant = response.into_message();
            let calls: Vec<OwnedToolCall> = assistant
                .tool_calls()
                .iter()
                .map(|c| OwnedToolCall {
                    id: c.id.to_string(),
                    name: c.name.to_string(),
                    arguments: c.arguments.clone(),
                })
                .collect();
            messages.push(assistant);

            if calls.is_empty() {
                let response_text = messages
                    .last()
                    .map(|m| m.text_content())
                    .unwrap_or_default();
                return Ok(AgentOutcome::completed(
                    &run.agent_name,
                    response_text,
                    tools_used,
                    steps,
                ));
            }

            steps += 1;
            if steps > run.recursion_limit {
                return Err(MaestroError::RecursionExceeded {
                    agent: run.agent_name.clone(),
                    limit: run.recursion_limit,
                });
            }

            for call in &calls {
                progress
                    .tool_start(&run.agent_name, &call.name, args_preview(&call.arguments))
                    .await;
            }

            // Execute the batch concurrently; handlers share no mutable state
            let executions = calls
                .iter()
                .map(|call| run.tools.execute(&call.name, call.arguments.clone()));
            let results = futures::future::join_all(executions).await;

            // Results are appended in call order, not finish order
            for (call, result) in calls.iter().zip(results) {
                let (text, ok) = match result {
                    Ok(output) => (output, true),
                    Err(e) => (format!("ERROR: {}", e), false),
                };
                progress.tool_end(&run.agent_name, &call.name, ok).await;
                messages.push(Message::tool_result(&call.id, text));
                tools_used.push(call.name.clone());
            }
        }
    }
}

struct OwnedToolCall {
    id: String,
    name: String,
    arguments: serde_json::Value,
}

/// Compact one-line preview of tool arguments for progress events
fn args_preview(arguments: &serde_json::Value) -> String {
    let rendered = arguments.to_string();
    if rendered.chars().count() <= 80 {
        rendered
    } else {
        let prefix: String = rendered.chars().take(77).collect();
        format!("{}...", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progress::ProgressEvent;
    use crate::llm::message::Role;
    use crate::llm::mock_provider::{MockProvider, MockResponse};
    use crate::tools::{FnTool, SchemaBuilder, Tool};
    use std::time::Duration;

    fn runtime(provider: MockProvider) -> AgentRuntime {
        AgentRuntime::new(
            Arc::new(ModelClient::new(Arc::new(provider))),
            Arc::new(Settings::default()),
        )
    }

    fn echo_tool() -> Arc<dyn Tool> {
        Arc::new(FnTool::new(
            "echo",
            "Echo text back",
            SchemaBuilder::new().string("text", "Text", true).build(),
            |args| async move { Ok(format!("echo: {}", args["text"].as_str().unwrap_or(""))) },
        ))
    }

    fn slow_tool(name: &str, delay_ms: u64, output: &str) -> Arc<dyn Tool> {
        let output = output.to_string();
        Arc::new(FnTool::new(
            name,
            "Slow tool",
            SchemaBuilder::new().build(),
            move |_args| {
                let output = output.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Ok(output)
                }
            },
        ))
    }

    fn failing_tool() -> Arc<dyn Tool> {
        Arc::new(FnTool::new(
            "bad",
            "Fails",
            SchemaBuilder::new().build(),
            |_args| async move { Err(MaestroError::ToolExecution("kaput".to_string())) },
        ))
    }

    fn agent_run(tools: Vec<Arc<dyn Tool>>, limit: u32) -> AgentRun {
        AgentRun {
            agent_name: "tester".to_string(),
            system_prompt: "You are a test agent.".to_string(),
            tools: ToolRegistry::from_tools(tools),
            middleware: MiddlewareChain::new(),
            recursion_limit: limit,
        }
    }

    #[tokio::test]
    async fn test_plain_text_response_ends_loop() {
        let provider = MockProvider::new().with_response("Direct answer");
        let rt = runtime(provider);
        let run = agent_run(vec![], 5);

        let outcome = rt
            .run(&run, "question", &[], &ProgressSink::disabled())
            .await
            .unwrap();

        assert_eq!(outcome.response, "Direct answer");
        assert_eq!(outcome.agent_name, "tester");
        assert!(outcome.tools_used.is_empty());
        assert_eq!(outcome.metadata.steps, 0);
    }

    #[tokio::test]
    async fn test_tool_loop_executes_and_returns() {
        let provider = MockProvider::new().with_script(vec![
            MockResponse::tool_call("echo", serde_json::json!({"text": "ping"})),
            MockResponse::text("Tool said ping"),
        ]);
        let handle = provider.clone();
        let rt = runtime(provider);
        let run = agent_run(vec![echo_tool()], 5);

        let outcome = rt
            .run(&run, "use echo", &[], &ProgressSink::disabled())
            .await
            .unwrap();

        assert_eq!(outcome.response, "Tool said ping");
        assert_eq!(outcome.tools_used, vec!["echo"]);
        assert_eq!(outcome.metadata.steps, 1);
        assert_eq!(handle.call_count(), 2);

        // The second request carried the tool result message
        let second = handle.last_request().unwrap();
        let tool_message = second
            .messages
            .iter()
            .find(|m| m.role == Role::Tool)
            .expect("tool result message");
        assert!(tool_message.text_content().contains("echo: ping"));
    }

    #[tokio::test]
    async fn test_recursion_limit_enforced() {
        // The model asks for the same tool forever
        let provider = MockProvider::new()
            .with_tool_call("echo", serde_json::json!({"text": "again"}));
        let rt = runtime(provider);
        let run = agent_run(vec![echo_tool()], 3);

        let err = rt
            .run(&run, "loop", &[], &ProgressSink::disabled())
            .await
            .unwrap_err();

        match err {
            MaestroError::RecursionExceeded { agent, limit } => {
                assert_eq!(agent, "tester");
                assert_eq!(limit, 3);
            }
            other => panic!("expected RecursionExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recursion_limit_one_allows_single_batch() {
        let provider = MockProvider::new().with_script(vec![
            MockResponse::tool_call("echo", serde_json::json!({"text": "once"})),
            MockResponse::text("done after one call"),
        ]);
        let rt = runtime(provider);
        let run = agent_run(vec![echo_tool()], 1);

        let outcome = rt
            .run(&run, "q", &[], &ProgressSink::disabled())
            .await
            .unwrap();
        assert_eq!(outcome.response, "done after one call");
    }

    #[tokio::test]
    async fn test_recursion_limit_one_rejects_second_batch() {
        let provider = MockProvider::new().with_script(vec![
            MockResponse::tool_call("echo", serde_json::json!({"text": "one"})),
            MockResponse::tool_call("echo", serde_json::json!({"text": "two"})),
            MockResponse::text("never reached"),
        ]);
        let rt = runtime(provider);
        let run = agent_run(vec![echo_tool()], 1);

        let err = rt
            .run(&run, "q", &[], &ProgressSink::disabled())
            .await
            .unwrap_err();
        assert!(matches!(err, MaestroError::RecursionExceeded { .. }));
    }

    #[tokio::test]
    async fn test_tool_results_in_call_order_despite_finish_order() {
        let provider = MockProvider::new().with_script(vec![
            MockResponse::tool_calls(vec![
                ("c1", "slow", serde_json::json!({})),
                ("c2", "fast", serde_json::json!({})),
                ("c3", "medium", serde_json::json!({})),
            ]),
            MockResponse::text("collected"),
        ]);
        let handle = provider.clone();
        let rt = runtime(provider);
        let run = agent_run(
            vec![
                slow_tool("slow", 60, "slow-result"),
                slow_tool("fast", 1, "fast-result"),
                slow_tool("medium", 25, "medium-result"),
            ],
            5,
        );

        rt.run(&run, "q", &[], &ProgressSink::disabled())
            .await
            .unwrap();

        let second = handle.last_request().unwrap();
        let tool_ids: Vec<String> = second
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| m.tool_call_id.clone().unwrap())
            .collect();
        assert_eq!(tool_ids, vec!["c1", "c2", "c3"]);
    }

    #[tokio::test]
    async fn test_concurrent_batch_is_actually_parallel() {
        let provider = MockProvider::new().with_script(vec![
            MockResponse::tool_calls(vec![
                ("c1", "a", serde_json::json!({})),
                ("c2", "b", serde_json::json!({})),
            ]),
            MockResponse::text("done"),
        ]);
        let rt = runtime(provider);
        let run = agent_run(
            vec![slow_tool("a", 80, "ra"), slow_tool("b", 80, "rb")],
            5,
        );

        let start = std::time::Instant::now();
        rt.run(&run, "q", &[], &ProgressSink::disabled())
            .await
            .unwrap();
        // Sequential execution would take >=160ms
        assert!(start.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_tool_error_is_stringified_and_siblings_complete() {
        let provider = MockProvider::new().with_script(vec![
            MockResponse::tool_calls(vec![
                ("c1", "bad", serde_json::json!({})),
                ("c2", "echo", serde_json::json!({"text": "fine"})),
            ]),
            MockResponse::text("recovered"),
        ]);
        let handle = provider.clone();
        let rt = runtime(provider);
        let run = agent_run(vec![failing_tool(), echo_tool()], 5);

        let outcome = rt
            .run(&run, "q", &[], &ProgressSink::disabled())
            .await
            .unwrap();
        assert_eq!(outcome.response, "recovered");
        assert_eq!(outcome.tools_used, vec!["bad", "echo"]);

        let second = handle.last_request().unwrap();
        let tool_texts: Vec<String> = second
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| m.text_content())
            .collect();
        assert!(tool_texts[0].starts_with("ERROR:"));
        assert!(tool_texts[0].contains("kaput"));
        assert!(tool_texts[1].contains("fine"));
    }

    #[tokio::test]
    async fn test_unknown_tool_call_recoverable() {
        let provider = MockProvider::new().with_script(vec![
            MockResponse::tool_call("phantom", serde_json::json!({})),
            MockResponse::text("apologies"),
        ]);
        let rt = runtime(provider);
        let run = agent_run(vec![], 5);

        let outcome = rt
            .run(&run, "q", &[], &ProgressSink::disabled())
            .await
            .unwrap();
        assert_eq!(outcome.response, "apologies");
    }

    #[tokio::test]
    async fn test_progress_events_emitted() {
        let provider = MockProvider::new().with_script(vec![
            MockResponse::tool_call("echo", serde_json::json!({"text": "x"})),
            MockResponse::text("ok"),
        ]);
        let rt = runtime(provider);
        let run = agent_run(vec![echo_tool()], 5);

        let (sink, mut rx) = ProgressSink::channel(16);
        rt.run(&run, "q", &[], &sink).await.unwrap();
        drop(sink);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert!(matches!(&events[0], ProgressEvent::Progress { source, .. } if source == "tester"));
        assert!(events
            .iter()
            .any(|e| matches!(e, ProgressEvent::ToolStart { tool, .. } if tool == "echo")));
        assert!(events
            .iter()
            .any(|e| matches!(e, ProgressEvent::ToolEnd { ok: true, .. })));
    }

    #[tokio::test]
    async fn test_history_is_passed_to_model() {
        let provider = MockProvider::new().with_response("with context");
        let handle = provider.clone();
        let rt = runtime(provider);
        let run = agent_run(vec![], 5);

        let history = vec![
            Message::user("earlier question"),
            Message::assistant("earlier answer"),
        ];
        rt.run(&run, "follow-up", &history, &ProgressSink::disabled())
            .await
            .unwrap();

        let request = handle.last_request().unwrap();
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].text_content(), "earlier question");
        assert_eq!(request.messages[2].text_content(), "follow-up");
    }

    #[test]
    fn test_args_preview_truncates() {
        let short = serde_json::json!({"a": 1});
        assert_eq!(args_preview(&short), short.to_string());

        let long = serde_json::json!({"text": "y".repeat(200)});
        let preview = args_preview(&long);
        assert!(preview.ends_with("..."));
        assert!(preview.chars().count() <= 80);
    }
}
