// src/parser/python.rs
//! Structural Python parser backed by tree-sitter.

use std::path::Path;

use tree_sitter::{Node, Parser as TsParser};

use super::{
    assemble, count_branches, decode, line_range, node_text, syntax_errors, CommentSyntax,
    Declaration, Parser,
};
use crate::error::{GaugeError, Result};
use crate::types::{AnalysisResult, ClassInfo, ClassKind, FunctionInfo};

pub const LANGUAGE: &str = "Python";

const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "except_clause",
    "with_statement",
    "try_statement",
    "boolean_operator",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct PythonParser;

impl PythonParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Parser for PythonParser {
    fn parse(&self, path: &Path, content: &[u8]) -> Result<AnalysisResult> {
        let source = decode(path, content)?;

        let mut parser = TsParser::new();
        parser
            .set_language(tree_sitter_python::language())
            .map_err(|e| GaugeError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let Some(tree) = parser.parse(source, None) else {
            return Err(GaugeError::Parse {
                path: path.to_path_buf(),
                message: "tree-sitter returned no tree".into(),
            });
        };

        let root = tree.root_node();
        let mut decls = Vec::new();
        collect_block(root, source, &mut decls);

        Ok(assemble(path, LANGUAGE, decls, syntax_errors(root, source)))
    }

    fn supported_extensions(&self) -> Vec<String> {
        vec![".py".into(), ".pyi".into()]
    }

    fn language_name(&self) -> &str {
        LANGUAGE
    }

    fn comment_syntax(&self) -> CommentSyntax {
        CommentSyntax::HASH
    }
}

fn collect_block(block: Node, source: &str, out: &mut Vec<Declaration>) {
    let mut cursor = block.walk();
    for child in block.named_children(&mut cursor) {
        match child.kind() {
            "function_definition" => out.push(Declaration::Function(function(child, source))),
            "class_definition" => out.push(Declaration::Class(class(child, source))),
            "decorated_definition" => {
                if let Some(def) = child.child_by_field_name("definition") {
                    collect_definition(def, source, out);
                }
            }
            "import_statement" => imports(child, source, out),
            "import_from_statement" => {
                if let Some(module) = child.child_by_field_name("module_name") {
                    out.push(Declaration::Import(node_text(module, source).to_string()));
                }
            }
            // Module-level guards such as `if TYPE_CHECKING:` or `try: import x`.
            "if_statement" | "try_statement" => collect_nested_imports(child, source, out),
            _ => {}
        }
    }
}

fn collect_definition(def: Node, source: &str, out: &mut Vec<Declaration>) {
    match def.kind() {
        "function_definition" => out.push(Declaration::Function(function(def, source))),
        "class_definition" => out.push(Declaration::Class(class(def, source))),
        _ => {}
    }
}

fn collect_nested_imports(node: Node, source: &str, out: &mut Vec<Declaration>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_statement" => imports(child, source, out),
            "import_from_statement" => {
                if let Some(module) = child.child_by_field_name("module_name") {
                    out.push(Declaration::Import(node_text(module, source).to_string()));
                }
            }
            "block" | "else_clause" | "except_clause" | "finally_clause" | "elif_clause" => {
                collect_nested_imports(child, source, out);
            }
            _ => {}
        }
    }
}

fn imports(node: Node, source: &str, out: &mut Vec<Declaration>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let name = match child.kind() {
            "dotted_name" => Some(child),
            "aliased_import" => child.child_by_field_name("name"),
            _ => None,
        };
        if let Some(name) = name {
            out.push(Declaration::Import(node_text(name, source).to_string()));
        }
    }
}

fn function(node: Node, source: &str) -> FunctionInfo {
    let name = node
        .child_by_field_name("name")
        .map_or("<anonymous>", |n| node_text(n, source));
    let (start, end) = line_range(node);
    let mut info = FunctionInfo::new(name, start, end);

    if let Some(params) = node.child_by_field_name("parameters") {
        info.parameters = parameters(params, source);
    }
    if let Some(ret) = node.child_by_field_name("return_type") {
        info.return_type = node_text(ret, source).to_string();
    }
    info.is_async = node.child(0).is_some_and(|c| c.kind() == "async");
    info.is_public = is_public_name(name);

    if let Some(body) = node.child_by_field_name("body") {
        info.has_docstring = has_docstring(body);
        info.complexity = 1 + count_branches(body, source, &is_branch);
    }
    info
}

fn is_branch(node: Node, _source: &str) -> bool {
    BRANCH_KINDS.contains(&node.kind())
}

fn parameters(params: Node, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for p in params.named_children(&mut cursor) {
        let raw = node_text(p, source);
        let name = raw
            .split([':', '='])
            .next()
            .unwrap_or(raw)
            .trim()
            .to_string();
        if name.is_empty() || name == "self" || name == "cls" || name == "*" || name == "/" {
            continue;
        }
        out.push(name);
    }
    out
}

fn class(node: Node, source: &str) -> ClassInfo {
    let name = node
        .child_by_field_name("name")
        .map_or("<anonymous>", |n| node_text(n, source));
    let (start, end) = line_range(node);
    let mut info = ClassInfo::new(name, ClassKind::Class, start, end);

    if let Some(bases) = node.child_by_field_name("superclasses") {
        let mut cursor = bases.walk();
        info.bases = bases
            .named_children(&mut cursor)
            .filter(|b| b.kind() != "keyword_argument")
            .map(|b| node_text(b, source).to_string())
            .collect();
    }

    let Some(body) = node.child_by_field_name("body") else {
        return info;
    };
    info.has_docstring = has_docstring(body);

    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        let def = if child.kind() == "decorated_definition" {
            child.child_by_field_name("definition")
        } else {
            Some(child)
        };
        let Some(def) = def else { continue };
        match def.kind() {
            "function_definition" => {
                info.methods.push(function(def, source));
                collect_self_fields(def, source, &mut info.fields);
            }
            "expression_statement" => collect_class_fields(def, source, &mut info.fields),
            _ => {}
        }
    }
    info
}

fn collect_class_fields(stmt: Node, source: &str, fields: &mut Vec<String>) {
    let mut cursor = stmt.walk();
    for child in stmt.named_children(&mut cursor) {
        if child.kind() != "assignment" {
            continue;
        }
        if let Some(left) = child.child_by_field_name("left") {
            if left.kind() == "identifier" {
                push_unique(fields, node_text(left, source));
            }
        }
    }
}

/// Picks up `self.x = ...` assignments inside a method body.
fn collect_self_fields(method: Node, source: &str, fields: &mut Vec<String>) {
    let Some(body) = method.child_by_field_name("body") else {
        return;
    };
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        if node.kind() == "assignment" {
            if let Some(left) = node.child_by_field_name("left") {
                let text = node_text(left, source);
                if let Some(attr) = text.strip_prefix("self.") {
                    if !attr.contains('.') {
                        push_unique(fields, attr);
                    }
                }
            }
        }
        if matches!(node.kind(), "function_definition" | "class_definition") {
            continue;
        }
        let mut cursor = node.walk();
        stack.extend(node.named_children(&mut cursor));
    }
}

fn push_unique(fields: &mut Vec<String>, name: &str) {
    if !fields.iter().any(|f| f == name) {
        fields.push(name.to_string());
    }
}

fn has_docstring(body: Node) -> bool {
    body.named_child(0).is_some_and(|first| {
        first.kind() == "expression_statement"
            && first.named_child(0).is_some_and(|s| s.kind() == "string")
    })
}

fn is_public_name(name: &str) -> bool {
    !name.starts_with('_') || (name.starts_with("__") && name.ends_with("__"))
}
