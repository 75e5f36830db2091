// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Agent system
//!
//! Definitions, the process-wide registry, the tool-loop runtime, and the
//! supervisor/formatter composition.

pub mod formatter;
pub mod registry;
pub mod runner;
pub mod supervisor;
pub mod types;

pub use formatter::{Formatter, FormatterSections};
pub use registry::AgentRegistry;
pub use runner::{AgentRun, AgentRuntime};
pub use supervisor::SupervisorBuilder;
pub use types::{AgentDefinition, AgentMetadata, AgentOutcome};
