// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Knowledge document schema
//!
//! Knowledge documents are markdown files with a structured header
//! delimited by `---` lines. The header carries `name` and `description`
//! plus arbitrary extra key/value pairs.
//!
//! ## Document format
//!
//! ```markdown
//! ---
//! name: deploy
//! description: How to deploy a service
//! ---
//!
//! # Deploying
//! ...
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MaestroError, Result};

/// A knowledge document (skill or fact)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    /// Document name (from the header)
    pub name: String,
    /// Short description (from the header)
    pub description: String,
    /// Path relative to the category root
    pub relative_path: String,
    /// The markdown body (header excluded)
    pub body: String,
    /// Extra header fields
    #[serde(default)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Structured header of a knowledge document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHeader {
    /// Document name
    pub name: String,
    /// One-line description
    pub description: String,
    /// Arbitrary extra fields
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl DocumentHeader {
    /// Re-emit the header block, `name` first, extras in sorted order
    pub fn emit(&self) -> String {
        let mut out = String::from("---\n");
        out.push_str(&format!("name: {}\n", self.name));
        out.push_str(&format!("description: {}\n", self.description));
        for (key, value) in &self.extra {
            out.push_str(&format!("{}: {}\n", key, scalar_to_string(value)));
        }
        out.push_str("---\n");
        out
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim_end()
            .to_string(),
    }
}

impl KnowledgeDocument {
    /// Parse a document from file content
    pub fn parse(content: &str, relative_path: impl Into<String>) -> Result<Self> {
        let (header, body) = parse_header(content)?;
        Ok(Self {
            name: header.name,
            description: header.description,
            relative_path: relative_path.into(),
            body,
            extra: header.extra,
        })
    }

    /// The header view of this document
    pub fn header(&self) -> DocumentHeader {
        DocumentHeader {
            name: self.name.clone(),
            description: self.description.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Parse the `---`-delimited header from a document
pub fn parse_header(content: &str) -> Result<(DocumentHeader, String)> {
    let content = content.trim_start_matches('\u{feff}').trim_start();

    if !content.starts_with("---") {
        return Err(MaestroError::Knowledge(
            "document must start with a --- header block".to_string(),
        ));
    }

    let after_first = &content[3..];
    let end_pos = after_first.find("\n---").ok_or_else(|| {
        MaestroError::Knowledge("missing closing --- for header block".to_string())
    })?;

    let header_text = after_first[..end_pos].trim();
    let body_start = 3 + end_pos + 4;
    let body = if body_start < content.len() {
        content[body_start..].trim().to_string()
    } else {
        String::new()
    };

    let header: DocumentHeader = serde_yaml::from_str(header_text)
        .map_err(|e| MaestroError::Knowledge(format!("invalid document header: {}", e)))?;

    if header.name.is_empty() {
        return Err(MaestroError::Knowledge(
            "document header requires a non-empty name".to_string(),
        ));
    }

    Ok((header, body))
}
