// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Maestro - multi-agent chatbot orchestration runtime
//!
//! Routes natural-language queries through a supervisor agent that calls
//! specialist agents as tools, then formats the result for the user.
//! Chatbot crates depend on this library, register their specialists in
//! the [`agents::AgentRegistry`], and hand everything to an
//! [`engine::ChatEngine`].

pub mod agents;
pub mod chat;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod logging;
pub mod middleware;
pub mod prompts;
pub mod security;
pub mod tools;
pub mod web;

pub use error::{MaestroError, Result};
