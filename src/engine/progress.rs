// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Progress streaming
//!
//! A channel abstraction for streaming progress events to clients during a
//! single turn. One producer (the engine task for that turn), one consumer
//! (the client); a bounded queue with awaiting send provides backpressure:
//! a stalled client delays the turn rather than dropping events. The sink
//! is scoped to one turn and closed when the turn returns.

use serde::Serialize;
use tokio::sync::mpsc;

/// Events streamed to clients during a turn
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Agent or tool status text
    Progress { source: String, text: String },
    /// A tool call is starting
    ToolStart {
        agent: String,
        tool: String,
        args_preview: String,
    },
    /// A tool call finished
    ToolEnd { agent: String, tool: String, ok: bool },
    /// Streaming token from the final reply
    Token { text: String },
    /// The formatted response
    Final { text: String },
    /// The turn failed with a user-visible message
    Error { message: String },
}

/// Sending side of the progress channel
///
/// A disabled sink swallows events, which keeps non-interactive callers
/// and tests simple.
#[derive(Clone)]
pub struct ProgressSink {
    tx: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressSink {
    /// Create a connected sink with the given queue capacity
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that discards all events
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Send an event, waiting when the queue is full
    ///
    /// A closed receiver is not an error: the client went away, the turn
    /// still completes.
    pub async fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event).await;
        }
    }

    /// Emit agent/tool status text
    pub async fn progress(&self, source: impl Into<String>, text: impl Into<String>) {
        self.send(ProgressEvent::Progress {
            source: source.into(),
            text: text.into(),
        })
        .await;
    }

    /// Emit a tool-start event
    pub async fn tool_start(
        &self,
        agent: impl Into<String>,
        tool: impl Into<String>,
        args_preview: impl Into<String>,
    ) {
        self.send(ProgressEvent::ToolStart {
            agent: agent.into(),
            tool: tool.into(),
            args_preview: args_preview.into(),
        })
        .await;
    }

    /// Emit a tool-end event
    pub async fn tool_end(&self, agent: impl Into<String>, tool: impl Into<String>, ok: bool) {
        self.send(ProgressEvent::ToolEnd {
            agent: agent.into(),
            tool: tool.into(),
            ok,
        })
        .await;
    }

    /// Emit the final formatted response
    pub async fn final_text(&self, text: impl Into<String>) {
        self.send(ProgressEvent::Final { text: text.into() }).await;
    }

    /// Emit a user-visible error
    pub async fn error(&self, message: impl Into<String>) {
        self.send(ProgressEvent::Error {
            message: message.into(),
        })
        .await;
    }
}
