// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Knowledge store
//!
//! Loads skills and facts from a package directory:
//!
//! ```text
//! <pkg>/skills/<name>.md           top-level, listed in the inventory
//! <pkg>/skills/<name>/<sub>.md     reachable by path, never listed
//! <pkg>/facts/<name>.md            same rules
//! ```
//!
//! Only top-level documents appear in the inventory; subdirectory documents
//! are reachable solely through explicit path reads (progressive
//! disclosure). Reads are confined to the category root; anything that
//! resolves outside it fails with `PathTraversal`.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::{MaestroError, Result};
use crate::knowledge::schema::KnowledgeDocument;

/// Knowledge category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Procedures: how to perform tasks
    Skills,
    /// Reference data: names, policies, configurations
    Facts,
}

impl Category {
    /// Directory name under the package root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Skills => "skills",
            Category::Facts => "facts",
        }
    }

    /// Human label used in inventory headings
    pub fn label(&self) -> &'static str {
        match self {
            Category::Skills => "Skills",
            Category::Facts => "Facts",
        }
    }
}

/// Inventory entry for a top-level document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub name: String,
    pub relative_path: String,
    pub description: String,
}

/// Skills/facts loader for one agent package
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    base: PathBuf,
}

impl KnowledgeStore {
    /// Create a store rooted at an agent package directory
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The root directory for a category
    pub fn category_root(&self, category: Category) -> PathBuf {
        self.base.join(category.dir_name())
    }

    /// Whether the category directory exists on disk
    pub fn has_category(&self, category: Category) -> bool {
        self.category_root(category).is_dir()
    }

    /// List top-level documents for the inventory
    ///
    /// Subdirectory documents never appear here. A missing category
    /// directory yields an empty list. Ordering is by file name so
    /// inventory text is deterministic.
    pub fn list_top_level(&self, category: Category) -> Result<Vec<DocumentSummary>> {
        let root = self.category_root(category);
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<PathBuf> = std::fs::read_dir(&root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().map(|e| e == "md").unwrap_or(false)
            })
            .collect();
        entries.sort();

        let mut summaries = Vec::new();
        for path in entries {
            let relative = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let content = std::fs::read_to_string(&path)?;
            match KnowledgeDocument::parse(&content, relative.clone()) {
                Ok(doc) => summaries.push(DocumentSummary {
                    name: doc.name,
                    relative_path: relative,
                    description: doc.description,
                }),
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }

        Ok(summaries)
    }

    /// Read a document body by path relative to the category root
    ///
    /// Subdirectory documents are readable here even though they never
    /// appear in the inventory. The resolved file must stay inside the
    /// category root.
    pub fn read(&self, category: Category, path: &str) -> Result<String> {
        Ok(self.read_document(category, path)?.body)
    }

    /// Read and parse a full document by relative path
    pub fn read_document(&self, category: Category, path: &str) -> Result<KnowledgeDocument> {
        let root = self.category_root(category);
        let resolved = resolve_within(&root, path)?;

        if !resolved.is_file() {
            return Err(MaestroError::Knowledge(format!(
                "no {} document at '{}'",
                category.dir_name(),
                path
            )));
        }

        let content = std::fs::read_to_string(&resolved)?;
        KnowledgeDocument::parse(&content, path)
    }
}

/// Resolve `path` against `root`, rejecting anything that escapes it
fn resolve_within(root: &Path, path: &str) -> Result<PathBuf> {
    let requested = Path::new(path);
    if requested.is_absolute() {
        return Err(MaestroError::PathTraversal(path.to_string()));
    }

    // Lexical normalization first: '..' must never climb above the root,
    // whether or not the target exists.
    let mut normalized = PathBuf::new();
    for component in requested.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(MaestroError::PathTraversal(path.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(MaestroError::PathTraversal(path.to_string()));
            }
        }
    }

    let candidate = root.join(&normalized);

    // Canonicalize when possible so symlinks cannot escape either.
    if let (Ok(canonical_root), Ok(canonical)) = (root.canonicalize(), candidate.canonicalize()) {
        if !canonical.starts_with(&canonical_root) {
            return Err(MaestroError::PathTraversal(path.to_string()));
        }
        return Ok(canonical);
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_doc(dir: &Path, relative: &str, name: &str, description: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            path,
            format!(
                "---\nname: {}\ndescription: {}\n---\n\nBody of {}.\n",
                name, description, name
            ),
        )
        .unwrap();
    }

    fn store_with_docs() -> (TempDir, KnowledgeStore) {
        let dir = TempDir::new().unwrap();
        let skills = dir.path().join("skills");
        write_doc(&skills, "deploy.md", "deploy", "how to deploy");
        write_doc(&skills, "triage.md", "triage", "how to triage");
        write_doc(&skills, "deploy/frontend.md", "deploy-frontend", "frontend specifics");
        let facts = dir.path().join("facts");
        write_doc(&facts, "regions.md", "regions", "deployment regions");
        let store = KnowledgeStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_list_top_level_excludes_subdirectories() {
        let (_dir, store) = store_with_docs();

        let skills = store.list_top_level(Category::Skills).unwrap();
        let names: Vec<&str> = skills.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, vec!["deploy", "triage"]);
        for summary in &skills {
            assert!(!summary.relative_path.contains('/'));
            assert!(!summary.relative_path.contains('\\'));
        }
    }

    #[test]
    fn test_list_top_level_missing_category_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = KnowledgeStore::new(dir.path());
        assert!(store.list_top_level(Category::Skills).unwrap().is_empty());
        assert!(!store.has_category(Category::Skills));
    }

    #[test]
    fn test_list_is_deterministic() {
        let (_dir, store) = store_with_docs();
        let first = store.list_top_level(Category::Skills).unwrap();
        let second = store.list_top_level(Category::Skills).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_read_top_level() {
        let (_dir, store) = store_with_docs();
        let body = store.read(Category::Skills, "deploy.md").unwrap();
        assert!(body.contains("Body of deploy"));
    }

    #[test]
    fn test_read_subdirectory_document() {
        let (_dir, store) = store_with_docs();
        let body = store.read(Category::Skills, "deploy/frontend.md").unwrap();
        assert!(body.contains("Body of deploy-frontend"));
    }

    #[test]
    fn test_read_facts_category() {
        let (_dir, store) = store_with_docs();
        let body = store.read(Category::Facts, "regions.md").unwrap();
        assert!(body.contains("Body of regions"));
    }

    #[test]
    fn test_read_traversal_rejected() {
        let (_dir, store) = store_with_docs();
        let err = store
            .read(Category::Skills, "../../etc/passwd")
            .unwrap_err();
        assert!(matches!(err, MaestroError::PathTraversal(_)));
    }

    #[test]
    fn test_read_absolute_path_rejected() {
        let (_dir, store) = store_with_docs();
        let err = store.read(Category::Skills, "/etc/passwd").unwrap_err();
        assert!(matches!(err, MaestroError::PathTraversal(_)));
    }

    #[test]
    fn test_read_dotdot_inside_root_is_fine() {
        let (_dir, store) = store_with_docs();
        // deploy/../triage.md normalizes to triage.md, still inside the root
        let body = store.read(Category::Skills, "deploy/../triage.md").unwrap();
        assert!(body.contains("Body of triage"));
    }

    #[test]
    fn test_read_missing_document() {
        let (_dir, store) = store_with_docs();
        let err = store.read(Category::Skills, "missing.md").unwrap_err();
        assert!(matches!(err, MaestroError::Knowledge(_)));
    }

    #[test]
    fn test_read_document_returns_header_fields() {
        let (_dir, store) = store_with_docs();
        let doc = store
            .read_document(Category::Skills, "deploy.md")
            .unwrap();
        assert_eq!(doc.name, "deploy");
        assert_eq!(doc.description, "how to deploy");
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::Skills.dir_name(), "skills");
        assert_eq!(Category::Facts.dir_name(), "facts");
        assert_eq!(Category::Skills.label(), "Skills");
    }

    #[test]
    fn test_unparseable_document_skipped_in_listing() {
        let dir = TempDir::new().unwrap();
        let skills = dir.path().join("skills");
        std::fs::create_dir_all(&skills).unwrap();
        std::fs::write(skills.join("broken.md"), "no header at all").unwrap();
        write_doc(&skills, "good.md", "good", "a good doc");

        let store = KnowledgeStore::new(dir.path());
        let listed = store.list_top_level(Category::Skills).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "good");
    }
}
