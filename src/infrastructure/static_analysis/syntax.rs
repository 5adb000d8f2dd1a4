//! Python syntax check and structural metrics via tree-sitter.

use tree_sitter::{Node, Parser, Tree};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::StaticMetrics;

/// Node kinds counted as branching constructs.
const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "try_statement",
    "with_statement",
    "assert_statement",
];

pub(crate) fn parse_python(source: &str) -> DomainResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::language())
        .map_err(|e| DomainError::StaticAnalysisFailed(format!("Failed to load Python grammar: {e}")))?;
    parser
        .parse(source, None)
        .ok_or_else(|| DomainError::StaticAnalysisFailed("Python parser returned no tree".to_string()))
}

/// Pre-order visit of every node under `node`, itself included.
///
/// Walks with a cursor so nesting depth never grows the call stack.
pub(crate) fn visit<'a>(node: Node<'a>, f: &mut impl FnMut(Node<'a>)) {
    let mut cursor = node.walk();
    loop {
        f(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            // The cursor cannot climb above `node`.
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// First parse error as `<message> (line N)`, if any.
pub fn first_syntax_error(tree: &Tree) -> Option<String> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }

    let mut found: Option<String> = None;
    visit(root, &mut |node| {
        if found.is_some() {
            return;
        }
        let line = node.start_position().row + 1;
        if node.is_error() {
            found = Some(format!("invalid syntax (line {line})"));
        } else if node.is_missing() {
            found = Some(format!("missing '{}' (line {line})", node.kind()));
        }
    });
    Some(found.unwrap_or_else(|| "invalid syntax (line 1)".to_string()))
}

/// Syntax validity and structural metrics; lint results are left empty.
///
/// On a syntax error only `line_count` and `todo_count` are filled in.
pub fn structural_metrics(source: &str) -> DomainResult<StaticMetrics> {
    let mut metrics = StaticMetrics {
        line_count: source.lines().count(),
        todo_count: source.to_lowercase().matches("todo").count(),
        ..StaticMetrics::default()
    };

    let tree = parse_python(source)?;
    if let Some(err) = first_syntax_error(&tree) {
        metrics.syntax_ok = false;
        metrics.syntax_error = Some(err);
        return Ok(metrics);
    }

    let mut function_lengths: Vec<usize> = Vec::new();
    visit(tree.root_node(), &mut |node| match node.kind() {
        "function_definition" => {
            let length = node.child_by_field_name("body").map_or(1, |body| {
                body.end_position().row - body.start_position().row + 1
            });
            function_lengths.push(length.max(1));
        }
        "class_definition" => metrics.class_count += 1,
        "boolean_operator" => {
            // `a and b and c` nests; count the outermost operator only.
            if node.parent().map_or(true, |p| p.kind() != "boolean_operator") {
                metrics.complexity += 1;
            }
        }
        kind if BRANCH_KINDS.contains(&kind) => metrics.complexity += 1,
        _ => {}
    });

    metrics.function_count = function_lengths.len();
    if !function_lengths.is_empty() {
        metrics.avg_function_length =
            function_lengths.iter().sum::<usize>() as f64 / function_lengths.len() as f64;
        metrics.max_function_length = function_lengths.iter().copied().max().unwrap_or(0);
    }

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"import pytest
from pkg import mod


class TestThing:
    def test_a(self):
        assert mod.f(1) == 2

    def test_b(self):
        if mod.g() and mod.h():
            assert True
        for _ in range(3):
            pass


def test_c():
    # TODO: cover the error branch
    with pytest.raises(ValueError):
        mod.f(-1)
"#;

    #[test]
    fn test_metrics_for_valid_module() {
        let metrics = structural_metrics(SAMPLE).unwrap();
        assert!(metrics.syntax_ok);
        assert_eq!(metrics.syntax_error, None);
        assert_eq!(metrics.function_count, 3);
        assert_eq!(metrics.class_count, 1);
        assert_eq!(metrics.todo_count, 1);
        // block span may include the trailing newline
        assert!((4..=5).contains(&metrics.max_function_length));
        // 2 asserts, if, and, for, with
        assert_eq!(metrics.complexity, 6);
        assert!(metrics.avg_function_length > 1.0);
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let src = "def test_a():\n    x = (1,\n\ndef test_b():\n    pass\n";
        let metrics = structural_metrics(src).unwrap();
        assert!(!metrics.syntax_ok);
        let err = metrics.syntax_error.unwrap();
        assert!(err.contains("(line "), "unexpected message: {err}");
        assert_eq!(metrics.function_count, 0);
        assert_eq!(metrics.line_count, 5);
    }

    fn nested_parens(depth: usize) -> String {
        format!(
            "def test_x():\n    x = {}1{}\n",
            "(".repeat(depth),
            ")".repeat(depth)
        )
    }

    #[test]
    fn test_visit_order_matches_preorder() {
        let tree = parse_python("def f():\n    return 1\n").unwrap();
        let mut kinds = Vec::new();
        visit(tree.root_node(), &mut |n| {
            if n.is_named() {
                kinds.push(n.kind());
            }
        });
        assert_eq!(
            kinds,
            vec!["module", "function_definition", "identifier", "parameters", "block", "return_statement", "integer"]
        );
    }

    #[test]
    fn test_visit_stays_within_subtree() {
        let tree = parse_python("def f():\n    pass\n\ndef g():\n    pass\n").unwrap();
        let first = tree.root_node().named_child(0).unwrap();
        let mut count = 0;
        visit(first, &mut |n| {
            assert!(n.start_byte() >= first.start_byte() && n.end_byte() <= first.end_byte());
            count += 1;
        });
        assert!(count > 1);
    }

    #[test]
    fn test_deeply_nested_expression_returns_metrics() {
        let metrics = structural_metrics(&nested_parens(10_000)).unwrap();
        assert_eq!(metrics.line_count, 2);
        if metrics.syntax_ok {
            assert_eq!(metrics.function_count, 1);
        } else {
            assert!(metrics.syntax_error.is_some());
        }
    }

    #[test]
    fn test_deeply_nested_unbalanced_expression_reports_error() {
        let src = format!("def test_x():\n    x = {}1\n", "(".repeat(10_000));
        let metrics = structural_metrics(&src).unwrap();
        assert!(!metrics.syntax_ok);
        assert!(metrics.syntax_error.unwrap().contains("(line "));
    }

    #[test]
    fn test_empty_source_is_valid() {
        let metrics = structural_metrics("").unwrap();
        assert!(metrics.syntax_ok);
        assert_eq!(metrics.line_count, 0);
        assert_eq!(metrics.function_count, 0);
    }
}
