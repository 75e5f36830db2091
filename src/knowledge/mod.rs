// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Knowledge subsystem
//!
//! Skills (procedures) and facts (reference data) packaged with an agent,
//! loaded from disk with progressive disclosure: only top-level documents
//! are advertised in the inventory, deeper ones are read by explicit path.

pub mod schema;
pub mod store;
pub mod tools;

pub use schema::{DocumentHeader, KnowledgeDocument};
pub use store::{Category, DocumentSummary, KnowledgeStore};
pub use tools::{knowledge_tools, ReadFactTool, ReadSkillTool, READ_FACT_TOOL, READ_SKILL_TOOL};
