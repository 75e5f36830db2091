// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Message types for LLM interactions
//!
//! Defines the message structures exchanged with models. A message is one
//! of four roles; assistant messages may carry tool calls, and tool
//! messages carry the result for a specific call id. Messages are
//! immutable once appended to a conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message
    pub id: Uuid,

    /// Role of the message sender
    pub role: Role,

    /// Content of the message
    pub content: MessageContent,

    /// When the message was created
    pub timestamp: DateTime<Utc>,

    /// The originating call id when this is a tool result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
    /// Tool result
    Tool,
}

/// Content of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Multiple content blocks (text and tool calls)
    Blocks(Vec<ContentBlock>),
}

/// A block of content within a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },

    /// Tool call request from the assistant
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
}

impl Message {
    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Create a new assistant message with content blocks
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
            timestamp: Utc::now(),
            tool_call_id: None,
        }
    }

    /// Create a tool result message for a specific call id
    pub fn tool_result(tool_call_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Tool,
            content: MessageContent::Text(result.into()),
            timestamp: Utc::now(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: MessageContent::Text(content.into()),
            timestamp: Utc::now(),
            tool_call_id: None,
        }
    }

    /// Get the text content of the message, joining text blocks
    pub fn text_content(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Get all tool calls carried by this message, in declaration order
    pub fn tool_calls(&self) -> Vec<ToolCallRef<'_>> {
        match &self.content {
            MessageContent::Text(_) => vec![],
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolCall {
                        id,
                        name,
                        arguments,
                    } => Some(ToolCallRef {
                        id,
                        name,
                        arguments,
                    }),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Check if the message carries any tool calls
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }

    /// Estimate token count for this message
    ///
    /// Byte-based heuristic (~4 bytes per token); approximate.
    pub fn estimate_tokens(&self) -> u32 {
        let content_len = match &self.content {
            MessageContent::Text(text) => text.len(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .map(|b| match b {
                    ContentBlock::Text { text } => text.len(),
                    ContentBlock::ToolCall {
                        name, arguments, ..
                    } => name.len() + arguments.to_string().len(),
                })
                .sum(),
        };
        ((content_len + MESSAGE_OVERHEAD_BYTES) / BYTES_PER_TOKEN) as u32
    }
}

const BYTES_PER_TOKEN: usize = 4;
const MESSAGE_OVERHEAD_BYTES: usize = 20;

/// Borrowed view of a single tool call inside an assistant message
#[derive(Debug, Clone, Copy)]
pub struct ToolCallRef<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub arguments: &'a serde_json::Value,
}

impl MessageContent {
    /// Get as text if it's a simple text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Blocks(_) => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// Conversation history
///
/// Append-only within a turn. Only summarization may replace a prefix,
/// and it replaces it with exactly one system synopsis message.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// All messages in the conversation
    pub messages: Vec<Message>,

    /// System prompt (if any)
    pub system_prompt: Option<String>,
}

impl Conversation {
    /// Create a new empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation with a system prompt
    pub fn with_system(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![],
            system_prompt: Some(system_prompt.into()),
        }
    }

    /// Add a message to the conversation
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Get the last assistant message
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
    }

    /// Check if the conversation is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Estimate the total token count for the conversation
    pub fn estimate_tokens(&self) -> u32 {
        let system_tokens = self
            .system_prompt
            .as_ref()
            .map(|s| (s.len() / BYTES_PER_TOKEN) as u32)
            .unwrap_or(0);
        let message_tokens: u32 = self.messages.iter().map(|m| m.estimate_tokens()).sum();
        system_tokens + message_tokens
    }
}

/// Estimate tokens for a message slice using the byte heuristic
pub fn estimate_tokens(messages: &[Message]) -> u32 {
    messages.iter().map(|m| m.estimate_tokens()).sum()
}
