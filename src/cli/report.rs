// src/cli/report.rs
//! Human-readable terminal output.

use std::path::Path;

use colored::{ColoredString, Colorize};

use crate::registry::ParserRegistry;
use crate::types::{AnalysisResult, EnhancedProjectAnalysis, Grade};
use crate::walker::WalkStats;

/// Files listed in the "most complex" section.
const TOP_FILES: usize = 5;

fn grade_label(grade: Grade) -> ColoredString {
    let text = grade.to_string();
    match grade {
        Grade::A => text.green().bold(),
        Grade::B => text.green(),
        Grade::C => text.yellow(),
        Grade::D => text.yellow().bold(),
        Grade::F => text.red().bold(),
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

pub fn print_analysis(analysis: &EnhancedProjectAnalysis) {
    let m = &analysis.metrics;
    let s = &analysis.summary;

    println!("{} {}", "codegauge".bold(), analysis.root.display());
    println!(
        "  {} analyzed, {} failed, {} lines in {}ms",
        s.analyzed,
        s.failed,
        analysis.total_lines(),
        analysis.duration_ms
    );
    println!();

    println!("{}", "Languages".cyan().bold());
    for (name, lang) in &analysis.languages {
        println!(
            "  {name:<10} {:>5} {}  {:>7} lines  {:>5} functions  {:>4} classes",
            lang.files,
            pluralize("file", lang.files),
            lang.lines,
            lang.functions,
            lang.classes
        );
    }
    println!();

    println!("{}", "Metrics".cyan().bold());
    println!(
        "  complexity       avg {:.1}  max {}  total {}",
        m.average_complexity, m.max_complexity, m.total_complexity
    );
    println!("  maintainability  {:.1}", m.maintainability_index);
    println!("  technical debt   {:.1}", m.technical_debt);
    println!("  documented       {:.1}%", m.documentation_ratio);
    println!("  code/comment     {:.1}", m.code_to_comment_ratio);
    println!();

    print_hotspots(&analysis.file_results, &analysis.root);
    print_dependencies(analysis);

    if !s.failures.is_empty() {
        println!("{}", "Skipped".yellow().bold());
        for failure in &s.failures {
            println!("  {} {}", failure.path.display(), failure.message.dimmed());
        }
        println!();
    }

    println!(
        "{} {:.1} ({})",
        "Quality:".bold(),
        analysis.quality.score,
        grade_label(analysis.quality.grade)
    );
}

fn print_hotspots(results: &[AnalysisResult], root: &Path) {
    if results.is_empty() {
        return;
    }
    let mut ranked: Vec<&AnalysisResult> = results.iter().collect();
    ranked.sort_by(|a, b| b.complexity.cmp(&a.complexity).then_with(|| a.path.cmp(&b.path)));

    println!("{}", "Most complex".cyan().bold());
    for r in ranked.iter().take(TOP_FILES) {
        let rel = r.path.strip_prefix(root).unwrap_or(&r.path);
        let mi = format!("MI {:.0}", r.maintainability);
        let mi = if r.maintainability < 20.0 { mi.red() } else { mi.normal() };
        println!("  {:>5}  {mi:<8}  {}", r.complexity, rel.display());
    }
    println!();
}

fn print_dependencies(analysis: &EnhancedProjectAnalysis) {
    let graph = &analysis.dependency_graph;
    let count = |map: &std::collections::BTreeMap<String, Vec<String>>| map.values().map(Vec::len).sum::<usize>();

    println!("{}", "Dependencies".cyan().bold());
    println!(
        "  {} standard, {} internal, {} external, max depth {}",
        count(&graph.standard),
        count(&graph.internal),
        count(&graph.external),
        graph.max_depth
    );
    for cycle in &graph.cycles {
        println!("  {} {}", "cycle:".red(), cycle.join(" -> "));
    }
    println!();
}

pub fn print_file(result: &AnalysisResult) {
    println!("{} ({})", result.path.display().to_string().bold(), result.language);
    println!(
        "  lines {} (code {}, comment {}, blank {})",
        result.line_count, result.code_lines, result.comment_lines, result.blank_lines
    );
    println!(
        "  complexity {}  maintainability {:.1}  debt {:.1}",
        result.complexity, result.maintainability, result.technical_debt
    );

    for f in &result.functions {
        println!("  {} {} [cc {}] L{}-{}", "fn".blue(), f.name, f.complexity, f.start_line, f.end_line);
    }
    for c in &result.classes {
        println!("  {} {} L{}-{}", "type".blue(), c.name, c.start_line, c.end_line);
        for m in &c.methods {
            println!("      {} [cc {}]", m.name, m.complexity);
        }
    }
    for dep in &result.dependencies {
        println!("  {} {} ({})", "use".blue(), dep.name, dep.kind.to_string().dimmed());
    }
    for e in &result.errors {
        println!("  {} {}:{} {}", "error".red(), e.line, e.column, e.message);
    }
}

pub fn print_walk(root: &Path, stats: &WalkStats) {
    println!("{} {}", "walk".bold(), root.display());
    for (ext, count) in &stats.by_extension {
        println!("  {ext:<6} {count}");
    }
    println!(
        "  {} {}, {} excluded, {} over size, {} unsupported, {} {}",
        stats.total_files,
        pluralize("file", stats.total_files),
        stats.excluded,
        stats.oversize,
        stats.unsupported,
        stats.errors,
        pluralize("error", stats.errors)
    );
}

pub fn print_languages(registry: &ParserRegistry) {
    println!("{}", "Languages".cyan().bold());
    for lang in registry.list_languages() {
        println!("  {lang}");
    }
    println!("{}", "Extensions".cyan().bold());
    println!("  {}", registry.list_extensions().join(" "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("file", 1), "file");
        assert_eq!(pluralize("file", 0), "files");
        assert_eq!(pluralize("error", 3), "errors");
    }
}
