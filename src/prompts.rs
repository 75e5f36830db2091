// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Default prompt templates
//!
//! Static prompt text used by the supervisor, specialists, formatter, and
//! summarizer. Chatbot authors can override the formatter sections through
//! the builder; the rest is engine-owned.

/// Base prompt for the supervisor agent
///
/// The capabilities section is appended at build time from the registry,
/// followed by [`PLANNING_PROMPT`].
pub const SUPERVISOR_PROMPT: &str = "\
You are an intelligent supervisor that orchestrates specialist agents to fully answer user questions.

## Your Workflow

1. Route: call the most relevant specialist agent(s) for the question.
2. Iterate: analyze each response. If it is incomplete or contains identifiers or references, make follow-up calls.
3. Investigate fully: never stop at partial information. If an agent returns IDs or says \"for details see...\", follow up on them.
4. Synthesize: once you have all needed information, provide a complete answer.

## Rules

- Answer from conversation context when the user asks about something already discussed; do not call tools for that.
- Call multiple agents in the same step when their tasks do not depend on each other.
- Never mention agents, tools, or internal systems to the user.
- Include relevant details, names, and identifiers in your answer.
";

/// Heading that precedes the registry capabilities section
pub const CAPABILITIES_HEADING: &str = "## Available Specialist Agents";

/// Planning block appended to supervisor and specialist prompts
///
/// Prompt-only replacement for an explicit task-list tool: the model plans
/// in its reasoning, issues independent tool calls together, and reviews
/// completeness before answering.
pub const PLANNING_PROMPT: &str = "\
## Planning

For multi-step work, think before acting:
- Break the request into the distinct pieces of information you need.
- Issue tool calls for independent pieces together, in a single step.
- Before answering, review whether every part of the request is covered; if not, continue.
";

/// Generic docstring template for specialist wrapper tools
///
/// Routing decisions are driven by the capabilities section of the
/// supervisor prompt, not by per-tool descriptions, so this stays generic.
pub fn agent_tool_description(name: &str) -> String {
    format!(
        "Invoke the {} specialist agent for queries about its domain. \
         Pass a self-contained natural-language query.",
        name
    )
}

/// Formatter section: synthesis core (rarely customized)
pub const FORMATTER_CORE: &str = "\
You take the information gathered by internal systems and present it as a natural, conversational response, as if you were directly answering the user's question yourself.
Do not mention agents, systems, or data sources. Write as the expert answering directly.";

/// Formatter section: voice and style (customizable)
pub const FORMATTER_TONE: &str = "\
Be conversational and natural. If the information does not fully answer the question, say what is known and what is not.";

/// Formatter section: output structure (customizable)
pub const FORMATTER_FORMAT: &str = "\
Write in plain text without markdown markup. Use clear paragraphs; simple lists with hyphens or numbers are fine.";

/// Formatter section: domain-specific additions (customizable, empty by default)
pub const FORMATTER_EXTRA: &str = "";

/// Prompt for the summarization model call
///
/// The conversation prefix to compress is supplied as the user message.
pub const SUMMARIZER_PROMPT: &str = "\
Condense the following conversation into a brief synopsis that preserves: what the user asked for, what was found or decided, and any identifiers, names, or numbers that later turns may need. Write a compact plain-text summary, nothing else.";

/// Marker carried by synopsis messages so re-summarization composes
pub const SUMMARY_MARKER: &str = "[conversation summary]";

/// Instructions injected when only skills tools are present
pub const SKILLS_INSTRUCTIONS: &str = "\
## Skills
The inventory below lists available task instructions. Use read_skill(path) to retrieve the full procedure before attempting a complex task. Skills may reference more specific sub-documents; read those by their path too.";

/// Instructions injected when only facts tools are present
pub const FACTS_INSTRUCTIONS: &str = "\
## Facts
The inventory below lists available reference data. Use read_fact(path) to retrieve precise names, identifiers, policies, and configurations instead of guessing.";

/// Combined instructions when both skills and facts are present
pub const KNOWLEDGE_INSTRUCTIONS: &str = "\
## Knowledge System
You have skills (how-to procedures) and facts (reference data), listed in the inventory below.
- read_skill(path): retrieve the full procedure for a task before attempting it.
- read_fact(path): retrieve precise names, identifiers, and business rules.
Check skills before complex tasks. Use facts for exact details.";

/// Phrase-interpretation guide for full-mode datetime context
///
/// English-locale table; other locales substitute their own.
pub const DATETIME_PHRASE_GUIDE: &str = "\
When the user says \"today\", use the current date. \"Yesterday\" is the previous calendar day. \"Last week\" means the last 7 days, \"last month\" the last 30 days, unless the user names a specific week or month; then use the reference dates above.";
