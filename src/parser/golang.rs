// src/parser/golang.rs
//! Heuristic Go parser: a line scanner driven by regexes and brace depth.
//!
//! No grammar is involved, so unusual formatting can confuse it. Brace
//! imbalance is reported as a [`ParseError`] rather than failing the file.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::{assemble, decode, Declaration, Parser};
use crate::error::Result;
use crate::types::{AnalysisResult, ClassInfo, ClassKind, FunctionInfo, ParseError};

pub const LANGUAGE: &str = "Go";

static FUNC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^func\s*(?:\(\s*(?:\w+\s+)?\*?\s*(\w+)(?:\[[^\]]*\])?\s*\))?\s*(\w+)\s*(?:\[[^\]]*\])?\s*\(")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});
static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^type\s+(\w+)(?:\[[^\]]*\])?\s+(struct|interface)\b")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});
static IMPORT_SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^import\s+(?:[\w.]+\s+)?"([^"]+)""#).unwrap_or_else(|_| panic!("Invalid Regex"))
});
static IMPORT_SPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:[\w.]+\s+)?"([^"]+)""#).unwrap_or_else(|_| panic!("Invalid Regex"))
});
static BRANCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bif\b|\bfor\b|\bcase\b|&&|\|\|").unwrap_or_else(|_| panic!("Invalid Regex"))
});
static IFACE_METHOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*\(").unwrap_or_else(|_| panic!("Invalid Regex")));

#[derive(Debug, Default, Clone, Copy)]
pub struct GoParser;

impl GoParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Parser for GoParser {
    fn parse(&self, path: &Path, content: &[u8]) -> Result<AnalysisResult> {
        let source = decode(path, content)?;
        let lines = strip_lines(source);
        let mut scan = Scanner::new(&lines);
        scan.run();

        // Methods whose receiver type lives in another file.
        let mut orphans: Vec<ClassInfo> = Vec::new();
        for (recv, method) in scan.orphan_methods() {
            match orphans.iter_mut().find(|c| c.name == recv) {
                Some(c) => c.methods.push(method),
                None => {
                    let mut c = ClassInfo::new(recv, ClassKind::Struct, method.start_line, method.end_line);
                    c.methods.push(method);
                    orphans.push(c);
                }
            }
        }

        let mut decls: Vec<Declaration> = scan.imports.into_iter().map(Declaration::Import).collect();
        decls.extend(scan.functions.into_iter().map(Declaration::Function));
        for mut class in scan.classes {
            class.methods.extend(
                scan.methods
                    .iter()
                    .filter(|(recv, _)| *recv == class.name)
                    .map(|(_, m)| m.clone()),
            );
            decls.push(match class.kind {
                ClassKind::Interface => Declaration::Interface(class),
                ClassKind::Class | ClassKind::Struct => Declaration::Class(class),
            });
        }
        decls.extend(orphans.into_iter().map(Declaration::Class));

        Ok(assemble(path, LANGUAGE, decls, scan.errors))
    }

    fn supported_extensions(&self) -> Vec<String> {
        vec![".go".into()]
    }

    fn language_name(&self) -> &str {
        LANGUAGE
    }
}

/// One source line with comments and literal contents removed.
struct Line<'a> {
    raw: &'a str,
    code: String,
}

/// Blanks out string/rune literal contents and comments so braces and
/// keywords inside them are not counted.
fn strip_lines(source: &str) -> Vec<Line<'_>> {
    let mut in_block = false;
    let mut in_raw_string = false;
    source
        .lines()
        .map(|raw| {
            let mut code = String::with_capacity(raw.len());
            let mut chars = raw.chars().peekable();
            while let Some(c) = chars.next() {
                if in_block {
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        in_block = false;
                    }
                    continue;
                }
                if in_raw_string {
                    if c == '`' {
                        in_raw_string = false;
                        code.push('`');
                    }
                    continue;
                }
                match c {
                    '/' if chars.peek() == Some(&'/') => break,
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        in_block = true;
                    }
                    '`' => {
                        in_raw_string = true;
                        code.push('`');
                    }
                    '"' | '\'' => {
                        code.push(c);
                        skip_literal(&mut chars, c);
                        code.push(c);
                    }
                    _ => code.push(c),
                }
            }
            Line { raw, code }
        })
        .collect()
}

fn skip_literal(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) {
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return;
        }
    }
}

fn brace_delta(code: &str) -> i64 {
    code.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

fn paren_delta(code: &str) -> i64 {
    code.chars().fold(0, |acc, c| match c {
        '(' => acc + 1,
        ')' => acc - 1,
        _ => acc,
    })
}

struct Scanner<'a, 'b> {
    lines: &'b [Line<'a>],
    pos: usize,
    imports: Vec<String>,
    functions: Vec<FunctionInfo>,
    classes: Vec<ClassInfo>,
    methods: Vec<(String, FunctionInfo)>,
    errors: Vec<ParseError>,
}

impl<'a, 'b> Scanner<'a, 'b> {
    fn new(lines: &'b [Line<'a>]) -> Self {
        Self {
            lines,
            pos: 0,
            imports: Vec::new(),
            functions: Vec::new(),
            classes: Vec::new(),
            methods: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(&mut self) {
        let lines = self.lines;
        let mut depth = 0i64;
        while self.pos < lines.len() {
            let idx = self.pos;
            let code = lines[idx].code.trim().to_string();
            self.pos += 1;

            if code.starts_with("import") {
                self.import(lines[idx].raw.trim(), &code);
            } else if let Some(caps) = FUNC_RE.captures(&code) {
                let receiver = caps.get(1).map(|m| m.as_str().to_string());
                let name = caps.get(2).map_or("", |m| m.as_str()).to_string();
                let tail_offset = caps.get(0).map_or(0, |m| m.end());
                let function = self.function(idx, &name, tail_offset);
                match receiver {
                    Some(recv) => self.methods.push((recv, function)),
                    None => self.functions.push(function),
                }
            } else if let Some(caps) = TYPE_RE.captures(&code) {
                let name = caps.get(1).map_or("", |m| m.as_str()).to_string();
                let kind = if caps.get(2).is_some_and(|m| m.as_str() == "interface") {
                    ClassKind::Interface
                } else {
                    ClassKind::Struct
                };
                self.type_decl(idx, name, kind);
            } else {
                depth += brace_delta(&code);
                if depth < 0 {
                    self.errors.push(ParseError::new(idx + 1, 1, "unexpected closing brace"));
                    depth = 0;
                }
            }
        }
    }

    fn import(&mut self, raw: &str, code: &str) {
        if let Some(caps) = IMPORT_SINGLE_RE.captures(raw) {
            self.imports.push(caps[1].to_string());
            return;
        }
        if !code.contains('(') {
            return;
        }
        // Grouped import block; literal contents were blanked, so read raw lines.
        let lines = self.lines;
        while self.pos < lines.len() {
            let line = &lines[self.pos];
            self.pos += 1;
            if line.code.trim_start().starts_with(')') {
                return;
            }
            if let Some(caps) = IMPORT_SPEC_RE.captures(line.raw.trim()) {
                self.imports.push(caps[1].to_string());
            }
        }
        self.errors.push(ParseError::new(self.lines.len(), 1, "unterminated import block"));
    }

    /// Consumes a brace-delimited block starting at line `start`. Returns the end index.
    fn block_end(&mut self, start: usize) -> usize {
        let lines = self.lines;
        let mut depth = brace_delta(&lines[start].code);
        // Bodyless declarations (assembly stubs) and one-liners end where they start.
        if depth <= 0 {
            return start;
        }
        while self.pos < lines.len() {
            depth += brace_delta(&lines[self.pos].code);
            self.pos += 1;
            if depth <= 0 {
                return self.pos - 1;
            }
        }
        self.errors.push(ParseError::new(
            start + 1,
            1,
            "unexpected end of file: unclosed brace",
        ));
        self.lines.len().saturating_sub(1)
    }

    /// Index of the line that closes the parameter list opened on line `start`.
    /// gofmt splits long signatures over several lines.
    fn signature_end(&mut self, start: usize) -> usize {
        let lines = self.lines;
        let mut depth = paren_delta(&lines[start].code);
        let mut end = start;
        while depth > 0 && self.pos < lines.len() {
            end = self.pos;
            depth += paren_delta(&lines[end].code);
            self.pos += 1;
        }
        end
    }

    fn function(&mut self, start: usize, name: &str, tail_offset: usize) -> FunctionInfo {
        let signature_end = self.signature_end(start);
        let lines = self.lines;
        let mut header = lines[start].code.trim().get(tail_offset..).unwrap_or("").to_string();
        for line in &lines[start + 1..=signature_end] {
            header.push(' ');
            header.push_str(line.code.trim());
        }

        let end = self.block_end(signature_end);
        let mut info = FunctionInfo::new(name, start + 1, end + 1);

        let (params, rest) = split_params(&header);
        info.parameters = param_names(params);
        info.return_type = rest.split('{').next().unwrap_or("").trim().to_string();
        info.is_public = name.chars().next().is_some_and(char::is_uppercase);
        info.has_docstring = self.has_doc_comment(start);

        let body_branches: usize = self.lines[start..=end]
            .iter()
            .map(|l| BRANCH_RE.find_iter(&l.code).count())
            .sum();
        info.complexity = 1 + body_branches;
        info
    }

    fn type_decl(&mut self, start: usize, name: String, kind: ClassKind) {
        let end = self.block_end(start);
        let mut info = ClassInfo::new(name, kind, start + 1, end + 1);
        info.has_docstring = self.has_doc_comment(start);

        let lines = self.lines;
        for (idx, line) in lines.iter().enumerate().take(end).skip(start + 1) {
            let code = line.code.trim();
            if code.is_empty() || code.starts_with('}') {
                continue;
            }
            match kind {
                ClassKind::Interface => {
                    if let Some(caps) = IFACE_METHOD_RE.captures(code) {
                        let mut m = FunctionInfo::new(&caps[1], idx + 1, idx + 1);
                        m.is_public = caps[1].chars().next().is_some_and(char::is_uppercase);
                        let tail = &code[caps.get(0).map_or(0, |c| c.end())..];
                        let (params, rest) = split_params(tail);
                        m.parameters = param_names(params);
                        m.return_type = rest.trim().to_string();
                        info.methods.push(m);
                    }
                }
                ClassKind::Struct | ClassKind::Class => {
                    for field in code.split(',') {
                        if let Some(name) = field.split_whitespace().next() {
                            if name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') {
                                info.fields.push(name.trim_start_matches('*').to_string());
                            }
                        }
                    }
                }
            }
        }
        self.classes.push(info);
    }

    fn has_doc_comment(&self, start: usize) -> bool {
        start > 0 && self.lines[start - 1].raw.trim_start().starts_with("//")
    }

    fn orphan_methods(&self) -> Vec<(String, FunctionInfo)> {
        self.methods
            .iter()
            .filter(|(recv, _)| !self.classes.iter().any(|c| &c.name == recv))
            .cloned()
            .collect()
    }
}

/// Splits `a int, b string) (int, error) {` into the parameter list and the remainder.
fn split_params(tail: &str) -> (&str, &str) {
    let mut depth = 1usize;
    for (i, c) in tail.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return (&tail[..i], &tail[i + 1..]);
                }
            }
            _ => {}
        }
    }
    (tail, "")
}

fn param_names(params: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in params.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                push_param(&mut names, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    push_param(&mut names, &current);
    names
}

fn push_param(names: &mut Vec<String>, piece: &str) {
    if let Some(first) = piece.split_whitespace().next() {
        names.push(first.to_string());
    }
}
