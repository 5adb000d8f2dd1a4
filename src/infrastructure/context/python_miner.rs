//! Context miner for Python targets.
//!
//! Collects top-level function and class names, their docstring summaries
//! and the module docstring summary. Missing, unreadable or unparsable files
//! yield an empty pack.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tree_sitter::Node;

use crate::domain::errors::DomainResult;
use crate::domain::models::ContextPack;
use crate::domain::ports::ContextMiner;
use crate::infrastructure::static_analysis::syntax::parse_python;

const DOCSTRING_MAX_CHARS: usize = 120;
const SUMMARY_MAX_CHARS: usize = 160;

/// Resolves target paths against a local checkout.
#[derive(Debug, Clone)]
pub struct PythonContextMiner {
    repo_root: PathBuf,
}

impl PythonContextMiner {
    /// Miner reading sources under `repo_root`.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Mine an in-memory module.
    pub fn mine_source(source: &str) -> ContextPack {
        let Ok(tree) = parse_python(source) else {
            return ContextPack::default();
        };
        let root = tree.root_node();
        let bytes = source.as_bytes();

        let mut pack = ContextPack {
            summary: docstring_of_block(root, bytes)
                .map(|d| first_line(&d, SUMMARY_MAX_CHARS))
                .unwrap_or_default(),
            ..ContextPack::default()
        };

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            let definition = if child.kind() == "decorated_definition" {
                match child.child_by_field_name("definition") {
                    Some(def) => def,
                    None => continue,
                }
            } else {
                child
            };
            if !matches!(definition.kind(), "function_definition" | "class_definition") {
                continue;
            }

            let Some(name) = definition
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(bytes).ok())
            else {
                continue;
            };
            pack.symbols.push(name.to_string());

            if let Some(doc) = definition
                .child_by_field_name("body")
                .and_then(|body| docstring_of_block(body, bytes))
            {
                let line = first_line(&doc, DOCSTRING_MAX_CHARS);
                if !line.is_empty() {
                    pack.docstrings.push(line);
                }
            }
        }

        pack
    }
}

/// Docstring of a module or block: a leading string expression statement.
fn docstring_of_block(block: Node<'_>, bytes: &[u8]) -> Option<String> {
    let mut cursor = block.walk();
    let first = block
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.named_child(0).filter(|n| n.kind() == "string")?;
    let raw = string.utf8_text(bytes).ok()?;
    Some(strip_string_literal(raw).to_string())
}

/// Remove prefix letters and matching quotes from a Python string literal.
fn strip_string_literal(raw: &str) -> &str {
    let body = raw.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    body
}

fn first_line(doc: &str, max_chars: usize) -> String {
    doc.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.chars().take(max_chars).collect())
        .unwrap_or_default()
}

#[async_trait]
impl ContextMiner for PythonContextMiner {
    async fn mine(&self, target_path: &Path) -> DomainResult<ContextPack> {
        let path = self.repo_root.join(target_path);
        match tokio::fs::read_to_string(&path).await {
            Ok(source) => Ok(Self::mine_source(&source)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "context target unreadable");
                Ok(ContextPack::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE: &str = r#""""Utility helpers for HTTP headers.

More detail here.
"""
import os


def parse_header(value):
    """Parse a header value into parts."""
    return value.split(";")


@decorator
def cached(fn):
    return fn


class Session(object):
    '''
    Stateful client session.
    '''

    def send(self):
        """Not top level."""
"#;

    #[test]
    fn test_mines_symbols_and_docstrings() {
        let pack = PythonContextMiner::mine_source(MODULE);
        assert_eq!(pack.summary, "Utility helpers for HTTP headers.");
        assert_eq!(pack.symbols, vec!["parse_header", "cached", "Session"]);
        assert_eq!(
            pack.docstrings,
            vec!["Parse a header value into parts.", "Stateful client session."]
        );
    }

    #[test]
    fn test_docstring_truncated() {
        let long = "x".repeat(300);
        let src = format!("def f():\n    \"\"\"{long}\"\"\"\n");
        let pack = PythonContextMiner::mine_source(&src);
        assert_eq!(pack.docstrings[0].chars().count(), 120);
    }

    #[tokio::test]
    async fn test_missing_file_yields_empty_pack() {
        let dir = tempfile::tempdir().unwrap();
        let miner = PythonContextMiner::new(dir.path());
        let pack = miner.mine(Path::new("nope/missing.py")).await.unwrap();
        assert!(pack.is_empty());
    }

    #[tokio::test]
    async fn test_reads_relative_to_repo_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pkg")).unwrap();
        std::fs::write(dir.path().join("pkg/mod.py"), "def helper():\n    pass\n").unwrap();

        let miner = PythonContextMiner::new(dir.path());
        let pack = miner.mine(Path::new("pkg/mod.py")).await.unwrap();
        assert_eq!(pack.symbols, vec!["helper"]);
        assert!(pack.summary.is_empty());
    }
}
