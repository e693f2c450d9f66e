// src/parser/rust.rs
//! Structural Rust parser backed by tree-sitter.

use std::path::Path;
use std::sync::LazyLock;

use tree_sitter::{Node, Parser as TsParser, Query, QueryCursor};

use super::{
    assemble, count_branches, decode, line_range, node_text, syntax_errors, Declaration, Parser,
};
use crate::error::{GaugeError, Result};
use crate::types::{AnalysisResult, ClassInfo, ClassKind, FunctionInfo};

pub const LANGUAGE: &str = "Rust";

const IMPORT_QUERY: &str = r"
    (use_declaration argument: (_) @import)
    (mod_item name: (identifier) @mod)
";

/// Compiled once per process; parsers on every worker share it.
static IMPORTS: LazyLock<std::result::Result<Query, String>> =
    LazyLock::new(|| Query::new(tree_sitter_rust::language(), IMPORT_QUERY).map_err(|e| e.to_string()));

#[derive(Debug, Default, Clone, Copy)]
pub struct RustParser;

impl RustParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Parser for RustParser {
    fn parse(&self, path: &Path, content: &[u8]) -> Result<AnalysisResult> {
        let source = decode(path, content)?;
        let parse_err = |message: String| GaugeError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let mut parser = TsParser::new();
        parser
            .set_language(tree_sitter_rust::language())
            .map_err(|e| parse_err(e.to_string()))?;
        let Some(tree) = parser.parse(source, None) else {
            return Err(parse_err("tree-sitter returned no tree".into()));
        };
        let root = tree.root_node();

        let mut items = Items::default();
        items.collect(root, source);

        let query = IMPORTS
            .as_ref()
            .map_err(|e| parse_err(format!("invalid import query: {e}")))?;
        let mut decls = imports(root, source, query);
        decls.extend(items.functions.into_iter().map(Declaration::Function));
        decls.extend(items.classes.into_iter().map(|c| match c.kind {
            ClassKind::Interface => Declaration::Interface(c),
            ClassKind::Class | ClassKind::Struct => Declaration::Class(c),
        }));

        Ok(assemble(path, LANGUAGE, decls, syntax_errors(root, source)))
    }

    fn supported_extensions(&self) -> Vec<String> {
        vec![".rs".into()]
    }

    fn language_name(&self) -> &str {
        LANGUAGE
    }
}

#[derive(Default)]
struct Items {
    functions: Vec<FunctionInfo>,
    classes: Vec<ClassInfo>,
}

impl Items {
    fn collect(&mut self, container: Node, source: &str) {
        let mut cursor = container.walk();
        for child in container.named_children(&mut cursor) {
            match child.kind() {
                "function_item" => self.functions.push(function(child, source)),
                "struct_item" => self.classes.push(structure(child, source)),
                "enum_item" => self.classes.push(enumeration(child, source)),
                "trait_item" => self.classes.push(trait_def(child, source)),
                "impl_item" => self.implementation(child, source),
                "mod_item" => {
                    if let Some(body) = child.child_by_field_name("body") {
                        self.collect(body, source);
                    }
                }
                _ => {}
            }
        }
    }

    fn implementation(&mut self, node: Node, source: &str) {
        let Some(ty) = node.child_by_field_name("type") else {
            return;
        };
        let name = base_type_name(node_text(ty, source));
        let methods = node
            .child_by_field_name("body")
            .map(|body| methods(body, source))
            .unwrap_or_default();

        if let Some(existing) = self.classes.iter_mut().find(|c| c.name == name) {
            existing.methods.extend(methods);
            return;
        }
        let (start, end) = line_range(node);
        let mut info = ClassInfo::new(name, ClassKind::Struct, start, end);
        info.has_docstring = has_doc_comment(node, source);
        info.methods = methods;
        self.classes.push(info);
    }
}

fn imports(root: Node, source: &str, query: &Query) -> Vec<Declaration> {
    let mut cursor = QueryCursor::new();
    let mut out = Vec::new();
    for m in cursor.matches(query, root, source.as_bytes()) {
        for capture in m.captures {
            let node = capture.node;
            let is_mod = query
                .capture_names()
                .get(capture.index as usize)
                .is_some_and(|n| n == "mod");
            if is_mod {
                // Inline modules are not dependencies.
                let declared = node.parent().is_some_and(|p| p.child_by_field_name("body").is_none());
                if declared {
                    out.push(Declaration::Import(format!("self::{}", node_text(node, source))));
                }
            } else {
                out.push(Declaration::Import(node_text(node, source).to_string()));
            }
        }
    }
    out
}

fn function(node: Node, source: &str) -> FunctionInfo {
    let name = node
        .child_by_field_name("name")
        .map_or("<anonymous>", |n| node_text(n, source));
    let (start, end) = line_range(node);
    let mut info = FunctionInfo::new(name, start, end);

    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        info.parameters = params
            .named_children(&mut cursor)
            .filter(|p| p.kind() == "parameter")
            .map(|p| {
                p.child_by_field_name("pattern")
                    .map_or_else(|| node_text(p, source), |pat| node_text(pat, source))
                    .to_string()
            })
            .collect();
    }
    if let Some(ret) = node.child_by_field_name("return_type") {
        info.return_type = node_text(ret, source).to_string();
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "visibility_modifier" => info.is_public = true,
            "function_modifiers" => info.is_async = node_text(child, source).contains("async"),
            _ => {}
        }
    }
    info.has_docstring = has_doc_comment(node, source);

    if let Some(body) = node.child_by_field_name("body") {
        info.complexity = 1 + count_branches(body, source, &is_branch);
    }
    info
}

fn is_branch(node: Node, source: &str) -> bool {
    match node.kind() {
        "if_expression" | "if_let_expression" | "match_arm" | "while_expression"
        | "while_let_expression" | "for_expression" => true,
        "binary_expression" => node
            .child_by_field_name("operator")
            .is_some_and(|op| matches!(node_text(op, source), "&&" | "||")),
        _ => false,
    }
}

fn methods(body: Node, source: &str) -> Vec<FunctionInfo> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|c| matches!(c.kind(), "function_item" | "function_signature_item"))
        .map(|c| function(c, source))
        .collect()
}

fn structure(node: Node, source: &str) -> ClassInfo {
    let mut info = named_class(node, source, ClassKind::Struct);
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        info.fields = body
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "field_declaration")
            .filter_map(|c| c.child_by_field_name("name"))
            .map(|n| node_text(n, source).to_string())
            .collect();
    }
    info
}

fn enumeration(node: Node, source: &str) -> ClassInfo {
    let mut info = named_class(node, source, ClassKind::Struct);
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        info.fields = body
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "enum_variant")
            .filter_map(|c| c.child_by_field_name("name"))
            .map(|n| node_text(n, source).to_string())
            .collect();
    }
    info
}

fn trait_def(node: Node, source: &str) -> ClassInfo {
    let mut info = named_class(node, source, ClassKind::Interface);
    if let Some(body) = node.child_by_field_name("body") {
        info.methods = methods(body, source);
    }
    info
}

fn named_class(node: Node, source: &str, kind: ClassKind) -> ClassInfo {
    let name = node
        .child_by_field_name("name")
        .map_or("<anonymous>", |n| node_text(n, source));
    let (start, end) = line_range(node);
    let mut info = ClassInfo::new(name, kind, start, end);
    info.has_docstring = has_doc_comment(node, source);
    info
}

/// Looks for `///` or `/** */` comments above an item, skipping attributes.
fn has_doc_comment(node: Node, source: &str) -> bool {
    let mut prev = node.prev_sibling();
    while let Some(sibling) = prev {
        match sibling.kind() {
            "attribute_item" => prev = sibling.prev_sibling(),
            "line_comment" | "block_comment" => {
                let text = node_text(sibling, source);
                return text.starts_with("///") || text.starts_with("/**");
            }
            _ => return false,
        }
    }
    false
}

/// `Foo<T>` and `crate::Foo` both become `Foo`.
fn base_type_name(text: &str) -> String {
    let no_generics = text.split('<').next().unwrap_or(text);
    no_generics
        .rsplit("::")
        .next()
        .unwrap_or(no_generics)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &str) -> AnalysisResult {
        RustParser::new()
            .parse(Path::new("lib.rs"), code.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_function_complexity() {
        // 1 + if + && + for + two match arms = 6
        let code = r"
fn route(a: bool, b: bool, items: &[u8]) -> u8 {
    if a && b {
        return 1;
    }
    for _ in items {}
    match a {
        true => 2,
        false => 3,
    }
}
";
        let result = parse(code);
        let f = &result.functions[0];
        assert_eq!(f.name, "route");
        assert_eq!(f.parameters, vec!["a", "b", "items"]);
        assert_eq!(f.return_type, "u8");
        assert_eq!(f.complexity, 6);
        assert!(!f.is_public);
    }

    #[test]
    fn test_struct_with_impl() {
        let code = r"
/// A counter.
#[derive(Debug)]
pub struct Counter {
    count: usize,
    step: usize,
}

impl Counter {
    pub fn bump(&mut self) {
        self.count += self.step;
    }

    pub async fn reset(&mut self) {}
}
";
        let result = parse(code);
        assert_eq!(result.classes.len(), 1);
        let counter = &result.classes[0];
        assert_eq!(counter.kind, ClassKind::Struct);
        assert!(counter.has_docstring);
        assert_eq!(counter.fields, vec!["count", "step"]);
        assert_eq!(counter.method_count(), 2);
        assert!(counter.methods[0].is_public);
        assert!(counter.methods[0].parameters.is_empty());
        assert!(counter.methods[1].is_async);
        assert!(counter.bases.is_empty());
    }

    #[test]
    fn test_trait_is_interface() {
        let code = "pub trait Shape {\n    fn area(&self) -> f64;\n}\n";
        let result = parse(code);
        assert_eq!(result.classes[0].kind, ClassKind::Interface);
        assert_eq!(result.classes[0].method_count(), 1);
    }

    #[test]
    fn test_imports() {
        let code = "use std::io;\nuse crate::config::Config;\nmod tests;\nmod inline { fn x() {} }\n";
        let result = parse(code);
        assert!(result.imports.contains(&"std::io".to_string()));
        assert!(result.imports.contains(&"crate::config::Config".to_string()));
        assert!(result.imports.contains(&"self::tests".to_string()));
        assert!(!result.imports.iter().any(|i| i.contains("inline")));
    }

    #[test]
    fn test_base_type_name() {
        assert_eq!(base_type_name("Vec<T>"), "Vec");
        assert_eq!(base_type_name("crate::types::Grade"), "Grade");
    }

    #[test]
    fn test_shared_query_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| parse("use std::fmt;\nuse serde::Serialize;\n").imports))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec!["std::fmt", "serde::Serialize"]);
        }
    }
}
