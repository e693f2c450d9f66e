// src/types.rs
//! Data model shared by parsers, the metrics calculator and the aggregator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A recoverable syntax problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    #[must_use]
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Where an import comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Part of the language's runtime library.
    Standard,
    /// Project-local.
    Internal,
    /// Third party.
    External,
}

impl DependencyKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Internal => "internal",
            Self::External => "external",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dependency {
    pub name: String,
    pub kind: DependencyKind,
    pub file: PathBuf,
    /// Always 1: usage sites are not counted.
    pub usage_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub parameters: Vec<String>,
    pub return_type: String,
    pub complexity: usize,
    pub is_public: bool,
    pub is_async: bool,
    pub has_docstring: bool,
}

impl FunctionInfo {
    /// Creates a function with base complexity 1 and no flags set.
    #[must_use]
    pub fn new(name: impl Into<String>, start_line: usize, end_line: usize) -> Self {
        Self {
            name: name.into(),
            start_line,
            end_line: end_line.max(start_line),
            parameters: Vec::new(),
            return_type: String::new(),
            complexity: 1,
            is_public: false,
            is_async: false,
            has_docstring: false,
        }
    }

    #[must_use]
    pub fn param_count(&self) -> usize {
        self.parameters.len()
    }

    /// Inclusive line span.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Struct,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    pub kind: ClassKind,
    pub start_line: usize,
    pub end_line: usize,
    pub methods: Vec<FunctionInfo>,
    pub fields: Vec<String>,
    /// Empty for languages without inheritance.
    pub bases: Vec<String>,
    /// Sum of method complexities, filled by the metrics calculator.
    pub complexity: usize,
    pub has_docstring: bool,
}

impl ClassInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ClassKind, start_line: usize, end_line: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            start_line,
            end_line: end_line.max(start_line),
            methods: Vec::new(),
            fields: Vec::new(),
            bases: Vec::new(),
            complexity: 0,
            has_docstring: false,
        }
    }

    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Analysis results for a single file.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub path: PathBuf,
    pub language: String,
    pub line_count: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub max_line_length: usize,
    pub avg_line_length: f64,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub imports: Vec<String>,
    pub dependencies: Vec<Dependency>,
    pub complexity: usize,
    pub maintainability: f64,
    pub technical_debt: f64,
    pub errors: Vec<ParseError>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    #[must_use]
    pub fn new(path: &Path, language: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            language: language.to_string(),
            line_count: 0,
            code_lines: 0,
            comment_lines: 0,
            blank_lines: 0,
            max_line_length: 0,
            avg_line_length: 0.0,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            dependencies: Vec::new(),
            complexity: 1,
            maintainability: 100.0,
            technical_debt: 0.0,
            errors: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// All methods across every class in the file.
    pub fn methods(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.classes.iter().flat_map(|c| c.methods.iter())
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectMetrics {
    pub total_complexity: usize,
    pub average_complexity: f64,
    pub max_complexity: usize,
    pub maintainability_index: f64,
    pub technical_debt: f64,
    pub documentation_ratio: f64,
    pub code_to_comment_ratio: f64,
    /// Reserved, always 0.
    pub duplication_percentage: f64,
    /// Reserved, always 0.
    pub test_coverage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LanguageStats {
    pub file_count: usize,
    pub line_count: usize,
    pub complexity: usize,
    pub average_complexity: f64,
    pub maintainability: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectoryStats {
    pub path: String,
    pub file_count: usize,
    pub test_file_count: usize,
    pub line_count: usize,
    pub complexity: usize,
    pub maintainability: f64,
    pub languages: BTreeMap<String, LanguageStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LanguageSummary {
    pub files: usize,
    pub lines: usize,
    pub functions: usize,
    pub classes: usize,
}

/// Adjacency maps keyed by file path, one per dependency kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    pub internal: BTreeMap<String, Vec<String>>,
    pub external: BTreeMap<String, Vec<String>>,
    pub standard: BTreeMap<String, Vec<String>>,
    pub cycles: Vec<Vec<String>>,
    pub max_depth: usize,
    /// Reserved, always empty.
    pub unused: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityScore {
    pub score: f64,
    pub grade: Grade,
}

/// A file that could not be analyzed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub analyzed: usize,
    pub failed: usize,
    pub failures: Vec<FileFailure>,
}

/// The terminal artifact of a directory run.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedProjectAnalysis {
    pub root: PathBuf,
    pub file_results: Vec<AnalysisResult>,
    pub metrics: ProjectMetrics,
    pub directories: BTreeMap<String, DirectoryStats>,
    pub languages: BTreeMap<String, LanguageSummary>,
    pub dependency_graph: DependencyGraph,
    pub quality: QualityScore,
    pub summary: RunSummary,
    pub duration_ms: u128,
}

impl EnhancedProjectAnalysis {
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.file_results.iter().map(|r| r.line_count).sum()
    }
}
