// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! End-to-end engine tests
//!
//! Each test drives a full turn (supervisor, specialists, formatter)
//! against a scripted mock provider. The provider consumes its scripted
//! responses in call order: supervisor calls and nested specialist calls
//! interleave in execution order, with the formatter call last.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use maestro::agents::{AgentDefinition, AgentRegistry};
use maestro::config::Settings;
use maestro::engine::{ChatEngine, ChatbotState, ProgressEvent, ProgressSink, WorkflowStep};
use maestro::llm::message::Role;
use maestro::llm::mock_provider::{MockProvider, MockResponse};
use maestro::llm::ModelClient;
use maestro::tools::{FnTool, SchemaBuilder, Tool};

fn engine_with(
    provider: MockProvider,
    settings: Settings,
    registry: AgentRegistry,
) -> ChatEngine {
    ChatEngine::new(
        Arc::new(ModelClient::new(Arc::new(provider))),
        Arc::new(settings),
        Arc::new(registry),
    )
}

fn weather_agent(counter: Arc<AtomicUsize>) -> AgentDefinition {
    let tool: Arc<dyn Tool> = Arc::new(FnTool::new(
        "get_weather",
        "Get current weather for a city",
        SchemaBuilder::new().string("city", "City name", true).build(),
        move |_args| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("Sunny, 22°C".to_string())
            }
        },
    ));
    AgentDefinition::new("weather", "answers weather questions", vec![tool])
}

fn echo_agent() -> AgentDefinition {
    let tool: Arc<dyn Tool> = Arc::new(FnTool::new(
        "echo",
        "Echo the query back",
        SchemaBuilder::new().string("text", "Text", false).build(),
        |args| async move { Ok(args["text"].as_str().unwrap_or("echo").to_string()) },
    ));
    AgentDefinition::new("looper", "echoes queries back", vec![tool])
}

fn sleepy_agent(delay: Duration) -> AgentDefinition {
    let tool: Arc<dyn Tool> = Arc::new(FnTool::new(
        "lookup",
        "Slow lookup",
        SchemaBuilder::new().build(),
        move |_args| async move {
            tokio::time::sleep(delay).await;
            Ok("finally".to_string())
        },
    ));
    AgentDefinition::new("slowpoke", "does slow lookups", vec![tool])
}

// Scenario 1: simple echo with no registered agents

#[tokio::test]
async fn simple_echo_no_agents() {
    let provider = MockProvider::new().with_responses(vec![
        "Hello! How can I help you today?".to_string(),
        "Hello! What can I do for you?".to_string(),
    ]);
    let handle = provider.clone();
    let engine = engine_with(provider, Settings::default(), AgentRegistry::new());

    let mut state = ChatbotState::new();
    let start = std::time::Instant::now();
    engine
        .run_turn(&mut state, "Hello.", &ProgressSink::disabled())
        .await;

    assert_eq!(state.workflow_step, WorkflowStep::Complete);
    assert!(start.elapsed() < engine.settings().supervisor_timeout());

    // One user + exactly one assistant message appended
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[1].role, Role::Assistant);

    // Supervisor ran with an empty tool list and produced no tool calls
    let requests = handle.recorded_requests();
    assert!(requests[0].tools.is_empty());
    assert!(state.chatbot_response.contains("Hello"));
}

// Scenario 2: single specialist route

#[tokio::test]
async fn single_specialist_route() {
    let provider = MockProvider::new().with_script(vec![
        // Supervisor routes to the weather wrapper
        MockResponse::tool_call("weather", serde_json::json!({"query": "weather in Tokyo"})),
        // The specialist calls its own tool
        MockResponse::tool_call("get_weather", serde_json::json!({"city": "Tokyo"})),
        // The specialist answers
        MockResponse::text("It is Sunny with a temperature of 22°C in Tokyo."),
        // The supervisor synthesizes
        MockResponse::text("Tokyo weather: Sunny, 22°C."),
        // The formatter polishes
        MockResponse::text("The weather in Tokyo right now is sunny at 22°C."),
    ]);
    let handle = provider.clone();

    let tool_calls = Arc::new(AtomicUsize::new(0));
    let registry = AgentRegistry::new();
    registry
        .register(weather_agent(Arc::clone(&tool_calls)), false)
        .unwrap();

    let engine = engine_with(provider, Settings::default(), registry);
    let mut state = ChatbotState::new();
    let (sink, mut rx) = ProgressSink::channel(64);

    engine
        .run_turn(&mut state, "What's the weather in Tokyo?", &sink)
        .await;
    drop(sink);

    assert_eq!(state.workflow_step, WorkflowStep::Complete);
    assert!(state.chatbot_response.contains("Tokyo"));

    // get_weather executed exactly once
    assert_eq!(tool_calls.load(Ordering::SeqCst), 1);

    // The specialist received the routed query as its user message
    let requests = handle.recorded_requests();
    assert_eq!(requests.len(), 5);
    let specialist_first = &requests[1];
    assert_eq!(
        specialist_first.messages.last().unwrap().text_content(),
        "weather in Tokyo"
    );

    // Specialist response flowed back through the supervisor
    let supervisor_second = &requests[3];
    let tool_result = supervisor_second
        .messages
        .iter()
        .find(|m| m.role == Role::Tool)
        .unwrap();
    assert!(tool_result.text_content().contains("Sunny"));
    assert!(tool_result.text_content().contains("22"));

    // Progress events for both levels arrived
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::ToolStart { tool, .. } if tool == "weather")));
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::ToolStart { tool, .. } if tool == "get_weather")));
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::Final { .. })));
}

// Scenario 3: recursion limit inside a specialist

#[tokio::test]
async fn specialist_recursion_limit_is_recoverable() {
    let provider = MockProvider::new().with_script(vec![
        MockResponse::tool_call("looper", serde_json::json!({"query": "loop"})),
        // The specialist keeps asking for its echo tool; the mock repeats
        // the last response, so the fourth batch trips the limit of 3.
        MockResponse::tool_call("echo", serde_json::json!({"text": "loop"})),
        MockResponse::tool_call("echo", serde_json::json!({"text": "loop"})),
        MockResponse::tool_call("echo", serde_json::json!({"text": "loop"})),
        MockResponse::tool_call("echo", serde_json::json!({"text": "loop"})),
        // After the tool error string, the supervisor apologizes
        MockResponse::text("That request kept looping; I had to stop it."),
        // The formatter passes the apology through
        MockResponse::text("Sorry, that request required too many steps to complete."),
    ]);
    let handle = provider.clone();

    let mut settings = Settings::default();
    settings.extras.insert(
        "looper".to_string(),
        serde_yaml::from_str("recursion_limit: 3").unwrap(),
    );

    let registry = AgentRegistry::new();
    registry.register(echo_agent(), false).unwrap();

    let engine = engine_with(provider, settings, registry);
    let mut state = ChatbotState::new();
    engine
        .run_turn(&mut state, "loop", &ProgressSink::disabled())
        .await;

    // No uncaught failure: the supervisor recovered and the turn completed
    assert_eq!(state.workflow_step, WorkflowStep::Complete);
    assert!(state.chatbot_response.contains("too many steps"));

    // The supervisor saw the specialist failure as a tool result string
    let recovery_request = handle
        .recorded_requests()
        .into_iter()
        .find(|r| {
            r.messages
                .iter()
                .any(|m| m.role == Role::Tool && m.text_content().contains("recursion limit"))
        })
        .expect("supervisor request carrying the error string");
    let error_text = recovery_request
        .messages
        .iter()
        .find(|m| m.role == Role::Tool)
        .unwrap()
        .text_content();
    assert!(error_text.starts_with("ERROR:"));
    assert!(error_text.contains("looper"));
}

// Scenario 4: specialist timeout recovery

#[tokio::test]
async fn specialist_timeout_recovery() {
    let provider = MockProvider::new().with_script(vec![
        MockResponse::tool_call("slowpoke", serde_json::json!({"query": "look this up"})),
        // Consumed by the specialist before its tool stalls
        MockResponse::tool_call("lookup", serde_json::json!({})),
        // Supervisor's second reasoning step after the timeout string
        MockResponse::text("The lookup did not finish in time; sorry about that."),
        MockResponse::text("Sorry, that lookup timed out. Please try again."),
    ]);
    let handle = provider.clone();

    let mut settings = Settings::default();
    settings.specialist_timeout = 0.15;
    settings.supervisor_timeout = 30.0;

    let registry = AgentRegistry::new();
    registry
        .register(sleepy_agent(Duration::from_secs(10)), false)
        .unwrap();

    let engine = engine_with(provider, settings, registry);
    let mut state = ChatbotState::new();

    let start = std::time::Instant::now();
    engine
        .run_turn(&mut state, "look this up", &ProgressSink::disabled())
        .await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(state.workflow_step, WorkflowStep::Complete);
    assert!(state.chatbot_response.contains("timed out"));

    // The supervisor received a "timed out" tool string, not an exception
    let has_timeout_string = handle.recorded_requests().iter().any(|r| {
        r.messages
            .iter()
            .any(|m| m.role == Role::Tool && m.text_content().contains("timed out"))
    });
    assert!(has_timeout_string);
}

// Scenario 6: datetime refresh across turns

#[tokio::test]
async fn datetime_block_refreshes_across_turns() {
    let provider = MockProvider::new().with_responses(vec![
        "answer one".to_string(),
        "reply one".to_string(),
        "answer two".to_string(),
        "reply two".to_string(),
    ]);
    let handle = provider.clone();
    let engine = engine_with(provider, Settings::default(), AgentRegistry::new());

    let mut state = ChatbotState::new();
    engine
        .run_turn(&mut state, "first", &ProgressSink::disabled())
        .await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    engine
        .run_turn(&mut state, "second", &ProgressSink::disabled())
        .await;

    let requests = handle.recorded_requests();
    // Supervisor requests are #0 and #2 (formatter calls carry no block)
    let first_system = requests[0].system.clone().unwrap();
    let second_system = requests[2].system.clone().unwrap();

    let extract_block = |s: &str| -> String {
        let start = s.find("<!-- datetime:start -->").unwrap();
        let end = s.find("<!-- datetime:end -->").unwrap();
        s[start..end].to_string()
    };

    assert_eq!(first_system.matches("<!-- datetime:start -->").count(), 1);
    assert_eq!(second_system.matches("<!-- datetime:start -->").count(), 1);

    let first_block = extract_block(&first_system);
    let second_block = extract_block(&second_system);
    assert_ne!(first_block, second_block);

    // The first turn's exact timestamp is absent from the second system
    let first_time_line = first_block
        .lines()
        .find(|l| l.starts_with("Current UTC time"))
        .unwrap();
    assert!(!second_system.contains(first_time_line));
}

// Invariant: recursion isolation between supervisor and specialist

#[tokio::test]
async fn specialist_gets_fresh_recursion_budget() {
    // Global limit 2. The specialist consumes exactly 2 tool batches, which
    // would fail if the supervisor's consumed step were inherited.
    let provider = MockProvider::new().with_script(vec![
        MockResponse::tool_call("looper", serde_json::json!({"query": "work"})),
        MockResponse::tool_call("echo", serde_json::json!({"text": "a"})),
        MockResponse::tool_call("echo", serde_json::json!({"text": "b"})),
        MockResponse::text("specialist finished after two tool steps"),
        MockResponse::text("all done"),
        MockResponse::text("All done."),
    ]);

    let mut settings = Settings::default();
    settings.recursion_limit = 2;

    let registry = AgentRegistry::new();
    registry.register(echo_agent(), false).unwrap();

    let engine = engine_with(provider, settings, registry);
    let mut state = ChatbotState::new();
    engine
        .run_turn(&mut state, "work", &ProgressSink::disabled())
        .await;

    assert_eq!(state.workflow_step, WorkflowStep::Complete);
    assert_eq!(state.chatbot_response, "All done.");
}

// Invariant: append-only history across turns

#[tokio::test]
async fn history_is_append_only_without_summarization() {
    let provider = MockProvider::new().with_responses(vec![
        "a1".to_string(),
        "r1".to_string(),
        "a2".to_string(),
        "r2".to_string(),
        "a3".to_string(),
        "r3".to_string(),
    ]);
    let engine = engine_with(provider, Settings::default(), AgentRegistry::new());

    let mut state = ChatbotState::new();
    let mut snapshots = Vec::new();
    for query in ["one", "two", "three"] {
        engine
            .run_turn(&mut state, query, &ProgressSink::disabled())
            .await;
        snapshots.push(state.messages.clone());
    }

    for window in snapshots.windows(2) {
        let (earlier, later) = (&window[0], &window[1]);
        assert!(earlier.len() < later.len());
        for (a, b) in earlier.iter().zip(later.iter()) {
            assert_eq!(a.id, b.id);
        }
    }
}

// Invariant: summarization replaces a prefix with one system message

#[tokio::test]
async fn summarization_boundary_replaces_prefix() {
    let mut settings = Settings::default();
    settings.summarization_enabled = true;
    settings.summarization_trigger_tokens = 50;
    settings.summarization_keep_messages = 2;

    // Two plain turns then a third whose start triggers compaction
    let provider = MockProvider::new().with_responses(vec![
        "a1".to_string() + &"x".repeat(300),
        "r1".to_string() + &"x".repeat(300),
        "a2".to_string() + &"x".repeat(300),
        "r2".to_string() + &"x".repeat(300),
        "a synopsis of earlier turns".to_string(),
        "a3".to_string(),
        "r3".to_string(),
    ]);
    let engine = engine_with(provider, settings, AgentRegistry::new());

    let mut state = ChatbotState::new();
    engine
        .run_turn(&mut state, "one", &ProgressSink::disabled())
        .await;
    engine
        .run_turn(&mut state, "two", &ProgressSink::disabled())
        .await;
    assert_eq!(state.messages.len(), 4);

    engine
        .run_turn(&mut state, "three", &ProgressSink::disabled())
        .await;

    // Prefix of 2 replaced by one system synopsis, then kept 2, then the
    // new turn's user+assistant pair.
    assert_eq!(state.messages.len(), 5);
    assert_eq!(state.messages[0].role, Role::System);
    assert!(state.messages[0]
        .text_content()
        .contains("[conversation summary]"));
    assert_eq!(state.chatbot_response, "r3");
}

// Invariant: turn duration bounded by the outer timeouts

#[tokio::test]
async fn turn_duration_bounded_by_timeouts() {
    let provider = MockProvider::new()
        .with_response("never fast enough")
        .with_delay(Duration::from_secs(10));

    let mut settings = Settings::default();
    settings.supervisor_timeout = 0.2;
    settings.formatter_timeout = 0.2;
    settings.llm_request_timeout = 5.0;

    let engine = engine_with(provider, settings, AgentRegistry::new());
    let mut state = ChatbotState::new();

    let start = std::time::Instant::now();
    engine
        .run_turn(&mut state, "q", &ProgressSink::disabled())
        .await;

    // supervisor_timeout + formatter_timeout + scheduling slack
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(state.workflow_step, WorkflowStep::Error);
}

// Rate limit translation to a user-visible message

#[tokio::test]
async fn rate_limit_surfaces_as_user_message() {
    // Exhaust the single retry as well
    let provider = MockProvider::new()
        .with_response("unused")
        .with_rate_limit_failures(5);
    let engine = engine_with(provider, Settings::default(), AgentRegistry::new());

    let mut state = ChatbotState::new();
    engine
        .run_turn(&mut state, "q", &ProgressSink::disabled())
        .await;

    assert_eq!(state.workflow_step, WorkflowStep::Error);
    assert!(state.chatbot_response.contains("rate limit"));
}
