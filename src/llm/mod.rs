// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM abstraction layer
//!
//! Message types, the provider trait, concrete providers, and the model
//! client that enforces per-call timeouts and the retry policy.

pub mod client;
pub mod message;
pub mod mock_provider;
pub mod provider;
pub mod providers;
pub mod retry;

pub use client::ModelClient;
pub use message::{Conversation, Message, Role};
pub use provider::{LlmProvider, ModelRequest, ReasoningEffort};
