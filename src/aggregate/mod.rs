// src/aggregate/mod.rs
//! Folds per-file results into one project-level report.

pub mod graph;
pub mod quality;
pub mod resolve;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::patterns::normalize_path;
use crate::types::{
    AnalysisResult, DependencyGraph, DependencyKind, DirectoryStats, EnhancedProjectAnalysis,
    LanguageStats, LanguageSummary, ProjectMetrics, RunSummary,
};

pub use quality::{compute as quality_score, grade_for, QualityInputs};

/// Case-insensitive file-name fragments that mark a test file.
const TEST_MARKERS: &[&str] = &["_test.", "test_", ".test.", "spec.", "_spec."];

/// Builds the report for `results` gathered under `root`.
///
/// Results are sorted by path first, so the output does not depend on the
/// order workers finished in. Run summary and duration are left for the caller.
#[must_use]
pub fn aggregate(mut results: Vec<AnalysisResult>, root: &Path) -> EnhancedProjectAnalysis {
    results.sort_by(|a, b| a.path.cmp(&b.path));

    let metrics = project_metrics(&results);
    let directories = directory_stats(&results, root);
    let languages = language_summary(&results);
    let dependency_graph = dependency_graph(&results, root);
    let quality = quality_score(QualityInputs::from(&metrics));

    tracing::debug!(
        files = results.len(),
        cycles = dependency_graph.cycles.len(),
        depth = dependency_graph.max_depth,
        score = quality.score,
        "aggregated project"
    );

    EnhancedProjectAnalysis {
        root: root.to_path_buf(),
        file_results: results,
        metrics,
        directories,
        languages,
        dependency_graph,
        quality,
        summary: RunSummary::default(),
        duration_ms: 0,
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn project_metrics(results: &[AnalysisResult]) -> ProjectMetrics {
    if results.is_empty() {
        return ProjectMetrics::default();
    }

    let total_complexity: usize = results.iter().map(|r| r.complexity).sum();
    let max_complexity = results.iter().map(|r| r.complexity).max().unwrap_or(0);
    let mi_sum: f64 = results.iter().map(|r| r.maintainability).sum();
    let technical_debt: f64 = results.iter().map(|r| r.technical_debt).sum();

    let (mut documented, mut entities) = (0usize, 0usize);
    for r in results {
        for f in r.functions.iter().chain(r.methods()) {
            entities += 1;
            documented += usize::from(f.has_docstring);
        }
        for c in &r.classes {
            entities += 1;
            documented += usize::from(c.has_docstring);
        }
    }

    let code: usize = results.iter().map(|r| r.code_lines).sum();
    let comments: usize = results.iter().map(|r| r.comment_lines).sum();

    ProjectMetrics {
        total_complexity,
        average_complexity: mean(total_complexity as f64, results.len()),
        max_complexity,
        maintainability_index: mean(mi_sum, results.len()),
        technical_debt,
        documentation_ratio: if entities == 0 {
            0.0
        } else {
            documented as f64 / entities as f64 * 100.0
        },
        code_to_comment_ratio: if comments == 0 { 0.0 } else { code as f64 / comments as f64 },
        duplication_percentage: 0.0,
        test_coverage: 0.0,
    }
}

#[must_use]
pub fn is_test_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    TEST_MARKERS.iter().any(|m| name.contains(m))
}

/// Root-relative directory key; files directly under the root map to `.`.
fn directory_key(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    match rel.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => normalize_path(parent),
        _ => ".".to_string(),
    }
}

fn file_key(path: &Path, root: &Path) -> String {
    normalize_path(path.strip_prefix(root).unwrap_or(path))
}

#[must_use]
pub fn directory_stats(results: &[AnalysisResult], root: &Path) -> BTreeMap<String, DirectoryStats> {
    let mut dirs: BTreeMap<String, DirectoryStats> = BTreeMap::new();
    // Maintainability sums, divided once every file is in.
    let mut mi_sums: BTreeMap<(String, Option<String>), f64> = BTreeMap::new();

    for r in results {
        let key = directory_key(&r.path, root);
        let dir = dirs.entry(key.clone()).or_insert_with(|| DirectoryStats {
            path: key.clone(),
            ..DirectoryStats::default()
        });
        dir.file_count += 1;
        dir.test_file_count += usize::from(is_test_file(&r.path));
        dir.line_count += r.line_count;
        dir.complexity += r.complexity;
        *mi_sums.entry((key.clone(), None)).or_default() += r.maintainability;

        let lang = dir.languages.entry(r.language.clone()).or_default();
        lang.file_count += 1;
        lang.line_count += r.line_count;
        lang.complexity += r.complexity;
        *mi_sums.entry((key, Some(r.language.clone()))).or_default() += r.maintainability;
    }

    for (key, dir) in &mut dirs {
        let sum = mi_sums.get(&(key.clone(), None)).copied().unwrap_or(0.0);
        dir.maintainability = mean(sum, dir.file_count);
        for (name, lang) in &mut dir.languages {
            finish_language(lang, mi_sums.get(&(key.clone(), Some(name.clone()))).copied().unwrap_or(0.0));
        }
    }
    dirs
}

#[allow(clippy::cast_precision_loss)]
fn finish_language(lang: &mut LanguageStats, mi_sum: f64) {
    lang.average_complexity = mean(lang.complexity as f64, lang.file_count);
    lang.maintainability = mean(mi_sum, lang.file_count);
}

#[must_use]
pub fn language_summary(results: &[AnalysisResult]) -> BTreeMap<String, LanguageSummary> {
    let mut out: BTreeMap<String, LanguageSummary> = BTreeMap::new();
    for r in results {
        let entry = out.entry(r.language.clone()).or_default();
        entry.files += 1;
        entry.lines += r.line_count;
        entry.functions += r.functions.len() + r.methods().count();
        entry.classes += r.classes.len();
    }
    out
}

/// Partitions every file's dependencies by kind. Internal imports that name
/// another analyzed file are recorded as that file's key, so cycles and
/// depth follow real file-to-file edges.
#[must_use]
pub fn dependency_graph(results: &[AnalysisResult], root: &Path) -> DependencyGraph {
    let files: BTreeSet<String> = results.iter().map(|r| file_key(&r.path, root)).collect();
    let mut deps = DependencyGraph::default();
    for r in results {
        let key = file_key(&r.path, root);
        for dep in &r.dependencies {
            let (map, target) = match dep.kind {
                DependencyKind::Internal => (
                    &mut deps.internal,
                    resolve::resolve(&r.language, &key, &dep.name, &files).unwrap_or_else(|| dep.name.clone()),
                ),
                DependencyKind::External => (&mut deps.external, dep.name.clone()),
                DependencyKind::Standard => (&mut deps.standard, dep.name.clone()),
            };
            let edges = map.entry(key.clone()).or_default();
            if !edges.contains(&target) {
                edges.push(target);
            }
        }
    }
    deps.cycles = graph::detect_cycles(&deps.internal);
    deps.max_depth = graph::max_depth(&deps.internal);
    deps
}
