// src/parser/mod.rs
//! The parser capability and the shared pieces every implementation uses.
//!
//! A parser turns raw file bytes into an [`AnalysisResult`]. Malformed input is
//! never fatal: syntax problems are recorded as [`ParseError`]s on a partial
//! result. Only undecodable content is returned as an error.

pub mod golang;
pub mod python;
pub mod rust;

use std::path::Path;

use crate::error::{GaugeError, Result};
use crate::types::{AnalysisResult, ClassInfo, FunctionInfo, ParseError};

pub use golang::GoParser;
pub use python::PythonParser;
pub use rust::RustParser;

/// Upper bound on syntax errors recorded per file.
pub const MAX_PARSE_ERRORS: usize = 50;

/// Line and block comment delimiters for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSyntax {
    pub line: &'static [&'static str],
    pub block: &'static [(&'static str, &'static str)],
}

impl CommentSyntax {
    pub const C_LIKE: Self = Self {
        line: &["//"],
        block: &[("/*", "*/")],
    };

    pub const HASH: Self = Self {
        line: &["#"],
        block: &[("\"\"\"", "\"\"\""), ("'''", "'''")],
    };
}

impl Default for CommentSyntax {
    fn default() -> Self {
        Self::C_LIKE
    }
}

pub trait Parser: Send + Sync {
    /// Parses one file.
    ///
    /// # Errors
    /// Returns an error only when the content cannot be processed at all.
    fn parse(&self, path: &Path, content: &[u8]) -> Result<AnalysisResult>;

    /// Lower-case, dot-prefixed extensions (e.g. `.py`).
    fn supported_extensions(&self) -> Vec<String>;

    fn language_name(&self) -> &str;

    fn comment_syntax(&self) -> CommentSyntax {
        CommentSyntax::default()
    }
}

/// The declaration kinds the analysis consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Function(FunctionInfo),
    Class(ClassInfo),
    Interface(ClassInfo),
    Import(String),
}

/// Folds declarations into a fresh result for `path`.
#[must_use]
pub fn assemble(
    path: &Path,
    language: &str,
    declarations: Vec<Declaration>,
    errors: Vec<ParseError>,
) -> AnalysisResult {
    let mut result = AnalysisResult::new(path, language);
    for decl in declarations {
        match decl {
            Declaration::Function(f) => result.functions.push(f),
            Declaration::Class(c) | Declaration::Interface(c) => result.classes.push(c),
            Declaration::Import(i) => {
                if !result.imports.contains(&i) {
                    result.imports.push(i);
                }
            }
        }
    }
    result.errors = errors;
    result
}

/// Decodes content as UTF-8, tolerating a leading byte-order mark.
///
/// # Errors
/// Returns `GaugeError::Parse` for invalid UTF-8.
pub fn decode<'a>(path: &Path, content: &'a [u8]) -> Result<&'a str> {
    let text = std::str::from_utf8(content).map_err(|e| GaugeError::Parse {
        path: path.to_path_buf(),
        message: format!("content is not valid UTF-8: {e}"),
    })?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Collects `ERROR` and missing nodes from a tree-sitter tree.
pub(crate) fn syntax_errors(root: tree_sitter::Node, source: &str) -> Vec<ParseError> {
    let mut errors = Vec::new();
    if root.has_error() {
        collect_errors(root, source, &mut errors);
    }
    errors
}

fn collect_errors(node: tree_sitter::Node, source: &str, out: &mut Vec<ParseError>) {
    if out.len() >= MAX_PARSE_ERRORS {
        return;
    }
    let pos = node.start_position();
    if node.is_missing() {
        out.push(ParseError::new(pos.row + 1, pos.column + 1, format!("missing `{}`", node.kind())));
        return;
    }
    if node.is_error() {
        let snippet: String = node
            .utf8_text(source.as_bytes())
            .unwrap_or("")
            .chars()
            .take(40)
            .collect();
        out.push(ParseError::new(
            pos.row + 1,
            pos.column + 1,
            format!("syntax error near `{}`", snippet.trim()),
        ));
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            collect_errors(child, source, out);
        }
    }
}

/// Counts branching constructs below `node`, using `is_branch` to classify kinds.
pub(crate) fn count_branches<F>(node: tree_sitter::Node, source: &str, is_branch: &F) -> usize
where
    F: Fn(tree_sitter::Node, &str) -> bool,
{
    let mut count = 0;
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if is_branch(current, source) {
            count += 1;
        }
        let mut cursor = current.walk();
        stack.extend(current.children(&mut cursor));
    }
    count
}

/// Text of a node, or empty on decode failure.
pub(crate) fn node_text<'a>(node: tree_sitter::Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// 1-based inclusive line range of a node.
pub(crate) fn line_range(node: tree_sitter::Node) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassKind;

    #[test]
    fn test_assemble_dedups_imports() {
        let decls = vec![
            Declaration::Import("os".into()),
            Declaration::Function(FunctionInfo::new("main", 1, 3)),
            Declaration::Import("os".into()),
            Declaration::Interface(ClassInfo::new("Reader", ClassKind::Interface, 5, 7)),
        ];
        let result = assemble(Path::new("a.py"), "Python", decls, Vec::new());
        assert_eq!(result.imports, vec!["os".to_string()]);
        assert_eq!(result.functions.len(), 1);
        assert_eq!(result.classes.len(), 1);
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let err = decode(Path::new("bad.py"), &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, GaugeError::Parse { .. }));
    }

    #[test]
    fn test_decode_strips_bom() {
        let text = decode(Path::new("a.go"), "\u{feff}package main".as_bytes()).unwrap();
        assert_eq!(text, "package main");
    }
}
