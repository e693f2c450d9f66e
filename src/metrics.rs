// src/metrics.rs
//! Per-file derived metrics: line classes, complexity rollup, maintainability,
//! technical debt and dependency classification.

use crate::parser::CommentSyntax;
use crate::types::{AnalysisResult, ClassInfo, Dependency, DependencyKind, FunctionInfo};

const PYTHON_STDLIB: &[&str] = &[
    "__future__", "abc", "argparse", "array", "ast", "asyncio", "base64", "bisect", "builtins",
    "bz2", "calendar", "cmath", "collections", "concurrent", "configparser", "contextlib",
    "contextvars", "copy", "csv", "ctypes", "dataclasses", "datetime", "decimal", "difflib",
    "dis", "email", "enum", "errno", "fnmatch", "fractions", "functools", "gc", "getpass",
    "gettext", "glob", "gzip", "hashlib", "heapq", "hmac", "html", "http", "importlib",
    "inspect", "io", "ipaddress", "itertools", "json", "keyword", "linecache", "locale",
    "logging", "lzma", "math", "mimetypes", "multiprocessing", "numbers", "operator", "os",
    "pathlib", "pickle", "platform", "pprint", "queue", "random", "re", "secrets", "select",
    "selectors", "shlex", "shutil", "signal", "socket", "sqlite3", "ssl", "stat", "statistics",
    "string", "struct", "subprocess", "sys", "sysconfig", "tarfile", "tempfile", "textwrap",
    "threading", "time", "timeit", "tkinter", "token", "tokenize", "traceback", "types",
    "typing", "unicodedata", "unittest", "urllib", "uuid", "warnings", "weakref", "xml",
    "zipfile", "zlib", "zoneinfo",
];

const RUST_STDLIB: &[&str] = &["std", "core", "alloc", "proc_macro", "test"];
const RUST_INTERNAL: &[&str] = &["crate", "self", "super"];

/// Cyclomatic complexity above which a function accrues debt.
const DEBT_COMPLEXITY: usize = 10;
const DEBT_PARAMS: usize = 5;
const DEBT_FUNCTION_LINES: usize = 50;
const DEBT_CLASS_METHODS: usize = 20;
const DEBT_CLASS_LINES: usize = 200;
const DEBT_LINE_LENGTH: usize = 120;
const MIN_COMMENT_RATIO: f64 = 0.1;

/// Line classification for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineStats {
    pub total: usize,
    pub code: usize,
    pub comment: usize,
    pub blank: usize,
    pub max_length: usize,
    pub avg_length: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCalculator;

impl MetricsCalculator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decorates a parsed result with every derived metric.
    #[must_use]
    pub fn enrich(&self, mut result: AnalysisResult, content: &[u8], syntax: CommentSyntax) -> AnalysisResult {
        let text = String::from_utf8_lossy(content);
        let lines = classify_lines(&text, syntax);
        result.line_count = lines.total;
        result.code_lines = lines.code;
        result.comment_lines = lines.comment;
        result.blank_lines = lines.blank;
        result.max_line_length = lines.max_length;
        result.avg_line_length = lines.avg_length;

        for f in &mut result.functions {
            f.complexity = f.complexity.max(1);
        }
        for class in &mut result.classes {
            for m in &mut class.methods {
                m.complexity = m.complexity.max(1);
            }
            class.complexity = class.methods.iter().map(|m| m.complexity).sum();
        }
        result.complexity = file_complexity(&result);
        result.maintainability = maintainability_index(result.code_lines, result.complexity);
        result.technical_debt = technical_debt(&result);

        let language = result.language.clone();
        result.dependencies = result
            .imports
            .iter()
            .map(|name| Dependency {
                name: name.clone(),
                kind: classify_dependency(&language, name),
                file: result.path.clone(),
                usage_count: 1,
                version: None,
            })
            .collect();
        result
    }
}

/// Splits text into blank, comment and code lines.
///
/// A line that opens a block comment after code counts as code; the lines
/// that follow count as comment until the block closes.
#[must_use]
pub fn classify_lines(text: &str, syntax: CommentSyntax) -> LineStats {
    let mut stats = LineStats::default();
    let mut open_block: Option<&str> = None;
    let mut total_length = 0usize;

    for raw in text.lines() {
        let line = raw.trim_end_matches('\r');
        let length = line.chars().count();
        stats.total += 1;
        total_length += length;
        stats.max_length = stats.max_length.max(length);

        let trimmed = line.trim();
        if let Some(end) = open_block {
            stats.comment += 1;
            if trimmed.contains(end) {
                open_block = None;
            }
            continue;
        }
        if trimmed.is_empty() {
            stats.blank += 1;
            continue;
        }
        if syntax.line.iter().any(|d| trimmed.starts_with(d)) {
            stats.comment += 1;
            continue;
        }
        if let Some((start, end)) = syntax.block.iter().find(|(s, _)| trimmed.starts_with(s)) {
            stats.comment += 1;
            if !trimmed[start.len()..].contains(end) {
                open_block = Some(*end);
            }
            continue;
        }

        stats.code += 1;
        open_block = unterminated_block(trimmed, syntax);
    }

    if stats.total > 0 {
        #[allow(clippy::cast_precision_loss)]
        let avg = total_length as f64 / stats.total as f64;
        stats.avg_length = avg;
    }
    stats
}

/// The closing delimiter of a block comment opened on a code line, if it stays open.
///
/// Delimiters inside string and char literals or after a line comment do not count.
fn unterminated_block(line: &str, syntax: CommentSyntax) -> Option<&'static str> {
    let code = blank_literals(line);
    syntax.block.iter().find_map(|(start, end)| {
        // Quote-style delimiters (Python docstrings) are literals themselves.
        let haystack = if start.starts_with(['"', '\'']) { line } else { code.as_str() };
        let pos = haystack.find(start)?;
        if syntax.line.iter().filter_map(|d| haystack.find(d)).any(|c| c < pos) {
            return None;
        }
        let rest = &haystack[pos + start.len()..];
        if rest.contains(end) {
            None
        } else {
            Some(*end)
        }
    })
}

/// Drops the contents of string, raw-string and char literals, keeping the quotes.
/// A `'` not closed within one (possibly escaped) character is a lifetime, not a literal.
fn blank_literals(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '"' | '`' => {
                while let Some(next) = chars.next() {
                    if next == '\\' && c == '"' {
                        chars.next();
                    } else if next == c {
                        out.push(c);
                        break;
                    }
                }
            }
            '\'' => {
                let mut ahead = chars.clone();
                let closed = match ahead.next() {
                    Some('\\') => ahead.nth(1) == Some('\''),
                    Some(_) => ahead.next() == Some('\''),
                    None => false,
                };
                if closed {
                    chars = ahead;
                    out.push('\'');
                }
            }
            _ => {}
        }
    }
    out
}

/// Sum of function and method complexities, never below 1.
#[must_use]
pub fn file_complexity(result: &AnalysisResult) -> usize {
    let functions: usize = result.functions.iter().map(|f| f.complexity).sum();
    let methods: usize = result.methods().map(|m| m.complexity).sum();
    (functions + methods).max(1)
}

/// `171 - 5.2 ln(V) - 0.23 C - 16.2 ln(L)` clamped to 0..=100, with `V = 2L`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn maintainability_index(code_lines: usize, complexity: usize) -> f64 {
    if code_lines == 0 {
        return 100.0;
    }
    let loc = code_lines.max(1) as f64;
    let volume = (2.0 * loc).max(1.0);
    let mi = 171.0 - 5.2 * volume.ln() - 0.23 * complexity as f64 - 16.2 * loc.ln();
    mi.clamp(0.0, 100.0)
}

#[allow(clippy::cast_precision_loss)]
fn excess(value: usize, limit: usize, weight: f64) -> f64 {
    if value > limit {
        weight * (value - limit) as f64
    } else {
        0.0
    }
}

fn function_debt(f: &FunctionInfo) -> f64 {
    excess(f.complexity, DEBT_COMPLEXITY, 0.5)
        + excess(f.param_count(), DEBT_PARAMS, 0.3)
        + excess(f.line_count(), DEBT_FUNCTION_LINES, 0.1)
}

fn class_debt(c: &ClassInfo) -> f64 {
    excess(c.method_count(), DEBT_CLASS_METHODS, 0.2) + excess(c.line_count(), DEBT_CLASS_LINES, 0.05)
}

/// Additive penalty score; never negative.
#[must_use]
pub fn technical_debt(result: &AnalysisResult) -> f64 {
    let mut debt: f64 = result.functions.iter().map(function_debt).sum();
    debt += result.methods().map(function_debt).sum::<f64>();
    debt += result.classes.iter().map(class_debt).sum::<f64>();
    debt += excess(result.max_line_length, DEBT_LINE_LENGTH, 0.01);

    if result.code_lines > 0 {
        #[allow(clippy::cast_precision_loss)]
        let ratio = result.comment_lines as f64 / result.code_lines as f64;
        if ratio < MIN_COMMENT_RATIO {
            debt += 10.0 * (MIN_COMMENT_RATIO - ratio);
        }
    }
    debt.max(0.0)
}

/// Classifies an import string for the given language.
#[must_use]
pub fn classify_dependency(language: &str, name: &str) -> DependencyKind {
    let name = name.trim().trim_start_matches("::");
    if is_relative(name) || has_internal_segment(name) {
        return DependencyKind::Internal;
    }
    match language {
        "Python" => {
            let top = name.split('.').next().unwrap_or(name);
            if PYTHON_STDLIB.contains(&top) {
                DependencyKind::Standard
            } else {
                DependencyKind::External
            }
        }
        "Rust" => {
            let top = name.split("::").next().unwrap_or(name);
            if RUST_INTERNAL.contains(&top) {
                DependencyKind::Internal
            } else if RUST_STDLIB.contains(&top) {
                DependencyKind::Standard
            } else {
                DependencyKind::External
            }
        }
        "Go" => {
            let first = name.split('/').next().unwrap_or(name);
            if first.contains('.') {
                DependencyKind::External
            } else {
                DependencyKind::Standard
            }
        }
        _ => DependencyKind::External,
    }
}

fn is_relative(name: &str) -> bool {
    name.starts_with('.')
}

fn has_internal_segment(name: &str) -> bool {
    name.split(['/', '.', ':']).any(|seg| seg == "internal")
}
