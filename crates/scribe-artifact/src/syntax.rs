//! Python syntax checking and definition lookup
//!
//! Uses tree-sitter for parsing. The grammar is error tolerant, so a parse
//! always yields a tree. Validity means the tree has no `ERROR` or `MISSING`
//! nodes and none of the constructs the grammar accepts but Python 3 rejects:
//! misaligned statements, empty blocks, and Python 2 `print`, `exec` and
//! `raise E, msg` statements.

use crate::path::SymbolPath;
use std::ops::Range;
use tree_sitter::{Node, Parser, Tree};

/// Syntax check failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    #[error("parse failed")]
    ParseFailed,

    #[error("syntax error at {line}:{column}: {message}")]
    Invalid {
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
        message: String,
    },
}

/// Parse Python source into a tree-sitter tree (errors are kept in the tree)
///
/// # Errors
/// Returns error if the parser cannot be initialized
pub fn parse_python(source: &str) -> Result<Tree, SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| SyntaxError::ParserInit(e.to_string()))?;

    parser.parse(source, None).ok_or(SyntaxError::ParseFailed)
}

/// Parse Python source and reject it if it contains any syntax error
///
/// # Errors
/// Returns [`SyntaxError::Invalid`] pointing at the first offending node
pub fn check_python(source: &str) -> Result<Tree, SyntaxError> {
    let tree = parse_python(source)?;
    let root = tree.root_node();

    if let Some(node) = first_error(root) {
        let message = if node.is_missing() {
            format!("missing `{}`", node.kind())
        } else {
            let text = node.utf8_text(source.as_bytes()).unwrap_or("");
            let snippet: String = text.lines().next().unwrap_or("").chars().take(40).collect();
            format!("unexpected `{snippet}`")
        };
        return Err(invalid_at(node, message));
    }

    let mut rejected = Vec::new();
    collect_rejected(root, source, &mut rejected);
    if let Some((node, message)) = rejected.into_iter().min_by_key(|(node, _)| node.start_byte()) {
        return Err(invalid_at(node, message.to_string()));
    }

    Ok(tree)
}

fn invalid_at(node: Node<'_>, message: String) -> SyntaxError {
    let position = node.start_position();
    SyntaxError::Invalid {
        line: position.row + 1,
        column: position.column + 1,
        message,
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Constructs the grammar accepts that Python 3 does not
fn collect_rejected<'t>(node: Node<'t>, source: &str, out: &mut Vec<(Node<'t>, &'static str)>) {
    match node.kind() {
        "print_statement" => out.push((node, "Python 2 print statement")),
        "exec_statement" => out.push((node, "Python 2 exec statement")),
        "raise_statement" if has_child_kind(node, "expression_list") => {
            out.push((node, "Python 2 raise with a comma"));
        }
        "module" => check_module_columns(node, source, out),
        "block" => check_block_columns(node, source, out),
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_rejected(child, source, out);
    }
}

fn has_child_kind(node: Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).any(|child| child.kind() == kind);
    found
}

/// Statements of a module or block, comments and line continuations excluded
fn statements(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let statements: Vec<Node<'_>> = node
        .named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect();
    statements
}

fn check_module_columns<'t>(module: Node<'t>, source: &str, out: &mut Vec<(Node<'t>, &'static str)>) {
    for statement in statements(module) {
        if starts_line(source, statement.start_byte()) && statement.start_position().column > 0 {
            out.push((statement, "unexpected indent"));
        }
    }
}

/// A block needs at least one statement, and the statements that open a line
/// share one column deeper than the header that owns the block
fn check_block_columns<'t>(block: Node<'t>, source: &str, out: &mut Vec<(Node<'t>, &'static str)>) {
    let body = statements(block);
    if body.is_empty() {
        out.push((block, "expected an indented block"));
        return;
    }

    let header_indent = block
        .parent()
        .map_or(0, |header| line_indent(source, header.start_byte()));
    let mut expected = None;

    for statement in body {
        if !starts_line(source, statement.start_byte()) {
            continue;
        }
        let column = statement.start_position().column;
        match expected {
            None => {
                if column <= header_indent {
                    out.push((statement, "expected an indented block"));
                }
                expected = Some(column);
            }
            Some(level) if column > level => out.push((statement, "unexpected indent")),
            Some(level) if column < level => {
                out.push((statement, "unindent does not match any outer indentation level"));
            }
            Some(_) => {}
        }
    }
}

fn line_start(source: &str, byte: usize) -> usize {
    source[..byte].rfind('\n').map_or(0, |i| i + 1)
}

/// Only whitespace precedes `byte` on its line
fn starts_line(source: &str, byte: usize) -> bool {
    source[line_start(source, byte)..byte]
        .chars()
        .all(char::is_whitespace)
}

fn line_indent(source: &str, byte: usize) -> usize {
    source[line_start(source, byte)..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count()
}

/// A function or method definition found in a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// `function` or `Class.method`
    pub symbol: SymbolPath,

    /// Byte range from the start of the definition's first line (indentation
    /// and decorators included) to the end of its body
    pub span: Range<usize>,
}

impl Definition {
    /// Verbatim text of the definition
    #[inline]
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

/// Collect top-level functions and the methods of top-level classes
///
/// Nested functions and nested classes are not reported.
#[must_use]
pub fn python_definitions(tree: &Tree, source: &str) -> Vec<Definition> {
    let mut definitions = Vec::new();
    let root = tree.root_node();
    let mut cursor = root.walk();

    for node in root.children(&mut cursor) {
        let (outer, inner) = unwrap_decorated(node);
        match inner.kind() {
            "function_definition" => {
                if let Some(name) = node_name(inner, source) {
                    definitions.push(Definition {
                        symbol: SymbolPath::single(name),
                        span: line_span(outer, source),
                    });
                }
            }
            "class_definition" => {
                if let Some(class_name) = node_name(inner, source) {
                    collect_methods(inner, &class_name, source, &mut definitions);
                }
            }
            _ => {}
        }
    }

    definitions
}

fn collect_methods(class: Node<'_>, class_name: &str, source: &str, out: &mut Vec<Definition>) {
    let Some(body) = class.child_by_field_name("body") else {
        return;
    };

    let mut cursor = body.walk();
    for node in body.children(&mut cursor) {
        let (outer, inner) = unwrap_decorated(node);
        if inner.kind() != "function_definition" {
            continue;
        }
        if let Some(name) = node_name(inner, source) {
            out.push(Definition {
                symbol: SymbolPath::new(vec![class_name.to_string(), name]),
                span: line_span(outer, source),
            });
        }
    }
}

/// `(decorated_definition, definition)` or `(node, node)`
fn unwrap_decorated(node: Node<'_>) -> (Node<'_>, Node<'_>) {
    if node.kind() == "decorated_definition" {
        if let Some(definition) = node.child_by_field_name("definition") {
            return (node, definition);
        }
    }
    (node, node)
}

fn node_name(node: Node<'_>, source: &str) -> Option<String> {
    let name = node
        .child_by_field_name("name")?
        .utf8_text(source.as_bytes())
        .ok()?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Extend a node's range back to the start of its line
fn line_span(node: Node<'_>, source: &str) -> Range<usize> {
    let start = node.start_byte();

    if starts_line(source, start) {
        line_start(source, start)..node.end_byte()
    } else {
        start..node.end_byte()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
import os


def top(a):
    return a


class Store:
    \"\"\"A store.\"\"\"

    def __init__(self):
        self.items = []

    @property
    def size(self):
        return len(self.items)

    class Inner:
        def hidden(self):
            pass


@cache
def cached():
    def nested():
        pass
    return nested
";

    #[test]
    fn valid_source_passes() {
        assert!(check_python(SOURCE).is_ok());
        assert!(check_python("").is_ok());
    }

    #[test]
    fn invalid_source_reports_position() {
        let err = check_python("def add(a, b:\n    return a +\n").unwrap_err();
        match err {
            SyntaxError::Invalid { line, .. } => assert!(line >= 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn prose_is_rejected() {
        assert!(check_python("Here are your tests: def (").is_err());
    }

    fn assert_rejected(source: &str, expected: &str) {
        match check_python(source) {
            Err(SyntaxError::Invalid { message, .. }) => {
                assert!(message.contains(expected), "{source:?}: {message}");
            }
            other => panic!("{source:?} should be rejected, got {other:?}"),
        }
    }

    #[test]
    fn misaligned_statements_are_rejected() {
        assert_rejected("x = 1\n    y = 2\n", "unexpected indent");
        assert_rejected("    x = 1\n", "unexpected indent");
        assert_rejected("def f():\n    a = 1\n        b = 2\n", "unexpected indent");
        assert_rejected("def f():\n        a = 1\n    b = 2\n", "indent");
    }

    #[test]
    fn empty_body_is_rejected() {
        assert_rejected("def f():\nreturn 1\n", "expected an indented block");
        assert_rejected(
            "class Cart:\n    def total(self, prices):\n    \"\"\"Sum.\"\"\"\n    return sum(prices)\n",
            "expected an indented block",
        );
    }

    #[test]
    fn python2_statements_are_rejected() {
        assert_rejected("print \"hello\"\n", "print");
        assert_rejected("exec \"x = 1\"\n", "exec");
        assert_rejected("raise ValueError, 'msg'\n", "raise");
    }

    #[test]
    fn python3_forms_of_the_same_statements_pass() {
        let source = "\
print(\"hello\")
exec(\"x = 1\")
if True: print(\"inline\")
a = 1; b = 2
total = (1 +
         2)


def f():
    # comment
    try:
        raise ValueError('msg') from None
    except ValueError:
        pass
    else:
        return [
    1,
        ]
";
        assert!(check_python(source).is_ok(), "{:?}", check_python(source).err());
    }

    #[test]
    fn definitions_cover_functions_and_methods() {
        let tree = parse_python(SOURCE).unwrap();
        let defs = python_definitions(&tree, SOURCE);
        let names: Vec<String> = defs.iter().map(|d| d.symbol.to_string()).collect();

        assert_eq!(names, vec!["top", "Store.__init__", "Store.size", "cached"]);
    }

    #[test]
    fn definition_text_starts_at_line_start() {
        let tree = parse_python(SOURCE).unwrap();
        let defs = python_definitions(&tree, SOURCE);

        let init = &defs[1];
        assert_eq!(
            init.text(SOURCE),
            "    def __init__(self):\n        self.items = []"
        );

        let size = &defs[2];
        assert!(size.text(SOURCE).starts_with("    @property\n    def size(self):"));

        let cached = &defs[3];
        assert!(cached.text(SOURCE).starts_with("@cache\ndef cached():"));
    }
}
