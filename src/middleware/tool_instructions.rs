// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool instructions middleware
//!
//! Inspects an agent's tool set at construction time. When the knowledge
//! reader tools are present, it builds a usage-instructions block plus the
//! top-level document inventory and prepends that to the system message on
//! every call. The inventory is read once at startup (synchronous I/O is
//! fine there) and cached on the middleware instance; there is no listing
//! tool, the injected inventory is the listing.

use async_trait::async_trait;

use crate::error::Result;
use crate::knowledge::store::{Category, KnowledgeStore};
use crate::knowledge::{READ_FACT_TOOL, READ_SKILL_TOOL};
use crate::llm::provider::ModelRequest;
use crate::middleware::Middleware;
use crate::prompts::{FACTS_INSTRUCTIONS, KNOWLEDGE_INSTRUCTIONS, SKILLS_INSTRUCTIONS};

/// Middleware injecting knowledge instructions and the static inventory
pub struct ToolInstructionsMiddleware {
    block: String,
}

impl ToolInstructionsMiddleware {
    /// Build the middleware from the agent's tool names
    ///
    /// Tool detection is by exact name: `read_skill` and/or `read_fact`.
    /// Agents without knowledge tools get an empty block and the
    /// middleware becomes a no-op.
    pub fn new<'a>(
        tool_names: impl IntoIterator<Item = &'a str>,
        store: Option<&KnowledgeStore>,
    ) -> Result<Self> {
        let names: Vec<&str> = tool_names.into_iter().collect();
        let has_skills = names.contains(&READ_SKILL_TOOL);
        let has_facts = names.contains(&READ_FACT_TOOL);

        // Combined pattern takes precedence over the individual ones
        let instructions = match (has_skills, has_facts) {
            (true, true) => KNOWLEDGE_INSTRUCTIONS,
            (true, false) => SKILLS_INSTRUCTIONS,
            (false, true) => FACTS_INSTRUCTIONS,
            (false, false) => {
                return Ok(Self {
                    block: String::new(),
                })
            }
        };

        let mut block = instructions.to_string();
        if let Some(store) = store {
            if has_skills {
                block.push_str("\n\n");
                block.push_str(&inventory_section(store, Category::Skills)?);
            }
            if has_facts {
                block.push_str("\n\n");
                block.push_str(&inventory_section(store, Category::Facts)?);
            }
        }

        Ok(Self { block })
    }

    /// The cached block (instructions plus inventory)
    pub fn block(&self) -> &str {
        &self.block
    }
}

#[async_trait]
impl Middleware for ToolInstructionsMiddleware {
    fn name(&self) -> &str {
        "tool_instructions"
    }

    async fn before_model(&self, request: &mut ModelRequest) -> Result<()> {
        if self.block.is_empty() {
            return Ok(());
        }

        let existing = request.system.take().unwrap_or_default();
        // Idempotent: retries must not duplicate the block
        if existing.contains(&self.block) {
            request.system = Some(existing);
            return Ok(());
        }

        request.system = Some(if existing.is_empty() {
            self.block.clone()
        } else {
            format!("{}\n\n{}", self.block, existing)
        });
        Ok(())
    }
}

/// Render one inventory section: `name — description` per top-level document
fn inventory_section(store: &KnowledgeStore, category: Category) -> Result<String> {
    let mut section = format!("### {} inventory", category.label());
    let summaries = store.list_top_level(category)?;
    if summaries.is_empty() {
        section.push_str("\n(no documents)");
    } else {
        for summary in summaries {
            section.push_str(&format!(
                "\n- {} — {} (path: {})",
                summary.name, summary.description, summary.relative_path
            ));
        }
    }
    Ok(section)
}
