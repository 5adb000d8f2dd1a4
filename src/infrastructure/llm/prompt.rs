//! Prompt composition for generation and refinement.

use std::fmt::Write as _;

use crate::domain::models::{ContextPack, TargetCoordinates};
use crate::domain::ports::{EnhanceTask, GenerationRequest};

/// Uncovered lines quoted in a refinement prompt.
const MAX_PROMPT_LINES: usize = 10;

/// Test style the candidate module follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFramework {
    /// `pytest` functions.
    Pytest,
    /// `unittest.TestCase` classes.
    Unittest,
}

impl TestFramework {
    /// Style for a fresh module: Django repositories use `unittest`.
    pub fn for_repo(repo: &str) -> Self {
        if is_django(repo) {
            Self::Unittest
        } else {
            Self::Pytest
        }
    }

    /// Style of an existing module, falling back to the repository default.
    pub fn infer(current_source: &str, repo: &str) -> Self {
        let lowered = current_source.to_lowercase();
        if lowered.contains("pytest") {
            return Self::Pytest;
        }
        if ["unittest", "testcase", "django.test"]
            .iter()
            .any(|marker| lowered.contains(marker))
        {
            return Self::Unittest;
        }
        Self::for_repo(repo)
    }

    fn style_rule(self) -> &'static str {
        match self {
            Self::Unittest => {
                "Use unittest-style classes (unittest.TestCase or django.test.SimpleTestCase) \
                 with self.assert* methods and unittest.mock. Do NOT import pytest or use \
                 pytest fixtures/decorators."
            }
            Self::Pytest => {
                "Use pytest-style test functions with plain asserts; fixtures are acceptable \
                 but keep the style consistent."
            }
        }
    }
}

fn is_django(repo: &str) -> bool {
    repo.to_lowercase().contains("django")
}

fn write_target(prompt: &mut String, target: &TargetCoordinates) {
    let _ = writeln!(prompt, "Repository: {}", target.repo);
    let _ = writeln!(prompt, "Version: {}", target.version);
    let _ = writeln!(prompt, "Target file: {}", target.code_file);
}

fn write_context(prompt: &mut String, context: &ContextPack) {
    if context.is_empty() {
        return;
    }
    prompt.push_str("Module context:\n");
    if !context.summary.is_empty() {
        let _ = writeln!(prompt, "- Summary: {}", context.summary);
    }
    if !context.symbols.is_empty() {
        let _ = writeln!(prompt, "- Symbols: {}", context.symbols.join(", "));
    }
    for doc in &context.docstrings {
        let _ = writeln!(prompt, "- {doc}");
    }
}

fn write_rules(prompt: &mut String, framework: TestFramework, repo: &str) {
    prompt.push_str("Follow these rules:\n");
    let _ = writeln!(prompt, "- {}", framework.style_rule());
    prompt.push_str("- Avoid network or database calls; prefer in-memory values and mocks.\n");
    prompt.push_str("- Use tempfile.TemporaryDirectory() when filesystem access is needed.\n");
    prompt.push_str("- Do not add `if __name__ == '__main__':` or call unittest.main/pytest.main.\n");
    if is_django(repo) {
        prompt.push_str("- Use django.test helpers and call functions directly instead of the test client.\n");
    }
}

/// Prompt for the first candidate of a run.
pub fn generation_prompt(request: &GenerationRequest) -> String {
    let framework = TestFramework::for_repo(&request.target.repo);
    let mut prompt = String::from(
        "You are an expert Python test generator. Maximise branch coverage and mutation \
         score for the target file.\n",
    );
    write_target(&mut prompt, &request.target);
    write_context(&mut prompt, &request.context);
    if let Some(source) = &request.target_source {
        prompt.push_str("Source of the file under test:\n----------------\n");
        prompt.push_str(source);
        prompt.push_str("\n----------------\n");
    }
    write_rules(&mut prompt, framework, &request.target.repo);
    prompt.push_str("Output ONLY the Python test module (plain code, no markdown).\n");
    prompt
}

/// Prompt for revising an existing candidate.
pub fn enhancement_prompt(task: &EnhanceTask) -> String {
    let framework = TestFramework::infer(&task.current_source, &task.target.repo);
    let mut prompt = String::from(
        "You are an expert Python test engineer improving an existing test module.\n",
    );
    write_target(&mut prompt, &task.target);
    write_context(&mut prompt, &task.context);
    write_rules(&mut prompt, framework, &task.target.repo);
    prompt.push_str("- Keep the existing imports unless a new helper is strictly required.\n");

    prompt.push_str("Current test suite:\n");
    prompt.push_str(&task.current_source);
    prompt.push('\n');

    let mut instructions: Vec<String> = task
        .instructions
        .iter()
        .filter(|i| !i.trim().is_empty())
        .map(|i| format!("- {i}"))
        .collect();
    if !task.uncovered_lines.is_empty() {
        let lines: Vec<String> = task
            .uncovered_lines
            .iter()
            .take(MAX_PROMPT_LINES)
            .map(u32::to_string)
            .collect();
        instructions.push(format!("- Increase coverage for lines: {}.", lines.join(", ")));
    }
    if instructions.is_empty() {
        instructions
            .push("- Improve coverage and robustness without breaking passing tests.".to_string());
    }

    prompt.push_str("Rewrite the suite applying these instructions while preserving its style:\n");
    prompt.push_str(&instructions.join("\n"));
    prompt.push_str("\nReturn only the revised Python test module (plain code, no markdown).\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(repo: &str) -> TargetCoordinates {
        TargetCoordinates {
            repo: repo.to_string(),
            version: "1.0".to_string(),
            code_file: "pkg/mod.py".to_string(),
        }
    }

    #[test]
    fn test_framework_inference() {
        assert_eq!(TestFramework::infer("import pytest\n", "django/django"), TestFramework::Pytest);
        assert_eq!(
            TestFramework::infer("from django.test import SimpleTestCase\n", "x/y"),
            TestFramework::Unittest
        );
        assert_eq!(TestFramework::infer("def test_a(): pass\n", "django/django"), TestFramework::Unittest);
        assert_eq!(TestFramework::infer("def test_a(): pass\n", "encode/httpx"), TestFramework::Pytest);
    }

    #[test]
    fn test_enhancement_prompt_lists_instructions_and_lines() {
        let task = EnhanceTask {
            target: target("encode/httpx"),
            attempt: 1,
            current_source: "def test_a():\n    assert True\n".to_string(),
            instructions: vec!["Add at least one test function so tests are collected.".to_string()],
            uncovered_lines: (1..=12).collect(),
            context: ContextPack::default(),
            target_source: None,
        };
        let prompt = enhancement_prompt(&task);
        assert!(prompt.contains("- Add at least one test function"));
        assert!(prompt.contains("Increase coverage for lines: 1, 2, 3, 4, 5, 6, 7, 8, 9, 10."));
        assert!(prompt.contains("pytest-style"));
    }

    #[test]
    fn test_generation_prompt_includes_source_and_django_rules() {
        let request = GenerationRequest {
            target: target("django/django"),
            context: ContextPack {
                summary: "Static file views.".to_string(),
                symbols: vec!["serve".to_string()],
                docstrings: Vec::new(),
            },
            target_source: Some("def serve(request):\n    pass".to_string()),
        };
        let prompt = generation_prompt(&request);
        assert!(prompt.contains("def serve(request)"));
        assert!(prompt.contains("Symbols: serve"));
        assert!(prompt.contains("Do NOT import pytest"));
        assert!(prompt.contains("django.test helpers"));
    }
}
