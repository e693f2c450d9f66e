// src/aggregate/resolve.rs
//! Maps internal import names to the analyzed files they refer to.
//!
//! Resolution only looks at the set of file keys in the run, never the disk.
//! Imports that match no analyzed file keep their written name.

use std::collections::BTreeSet;

/// Resolves `import` written in the file `current` (a root-relative key) to
/// another file key, if one of `files` matches.
#[must_use]
pub fn resolve(language: &str, current: &str, import: &str, files: &BTreeSet<String>) -> Option<String> {
    match language {
        "Python" => resolve_python(current, import, files),
        "Rust" => resolve_rust(current, import, files),
        _ => None,
    }
}

/// Directory segments of a `/`-separated key, without the file name.
fn parent_segments(key: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = key.split('/').collect();
    parts.pop();
    parts
}

fn resolve_python(current: &str, import: &str, files: &BTreeSet<String>) -> Option<String> {
    let dots = import.chars().take_while(|c| *c == '.').count();
    let rest: Vec<&str> = import[dots..].split('.').filter(|s| !s.is_empty()).collect();

    let mut base = if dots == 0 { Vec::new() } else { parent_segments(current) };
    for _ in 1..dots {
        base.pop()?;
    }
    base.extend(rest);
    if base.is_empty() {
        return None;
    }

    let module = base.join("/");
    [format!("{module}.py"), format!("{module}/__init__.py")]
        .into_iter()
        .find(|candidate| files.contains(candidate) && candidate != current)
}

fn resolve_rust(current: &str, import: &str, files: &BTreeSet<String>) -> Option<String> {
    // `use crate::a::{b, c}` resolves through its shared prefix.
    let path = import.split("::{").next().unwrap_or(import);
    let mut parts: Vec<&str> = path.split("::").filter(|s| !s.is_empty()).collect();

    let base = match parts.first().copied() {
        Some("crate") => {
            parts.remove(0);
            crate_root(current)
        }
        Some("self") => {
            parts.remove(0);
            module_dir(current)
        }
        Some("super") => {
            let mut dir = module_dir(current);
            while parts.first() == Some(&"super") {
                parts.remove(0);
                dir.pop()?;
            }
            dir
        }
        _ => return None,
    };

    // The path may end in an item (`crate::model::Item`); try the longest module prefix first.
    for len in (1..=parts.len()).rev() {
        let mut segments = base.clone();
        segments.extend(&parts[..len]);
        let module = segments.join("/");
        let hit = [format!("{module}.rs"), format!("{module}/mod.rs")]
            .into_iter()
            .find(|candidate| files.contains(candidate) && candidate != current);
        if hit.is_some() {
            return hit;
        }
    }
    None
}

/// Segments of the nearest enclosing `src` directory, or the file's own directory.
fn crate_root(current: &str) -> Vec<&str> {
    let parents = parent_segments(current);
    match parents.iter().rposition(|s| *s == "src") {
        Some(pos) => parents[..=pos].to_vec(),
        None => parents,
    }
}

/// Directory holding the child modules of the module defined by `current`.
fn module_dir(current: &str) -> Vec<&str> {
    let mut dir = parent_segments(current);
    let file = current.rsplit('/').next().unwrap_or(current);
    match file {
        "lib.rs" | "main.rs" | "mod.rs" => {}
        other => dir.push(other.strip_suffix(".rs").unwrap_or(other)),
    }
    dir
}
