// src/patterns.rs
//! Exclude/include pattern matching with best-effort gitignore semantics.
//!
//! Supported: exact names, `*` wildcards anywhere in the pattern, trailing `/`
//! (directories only) and leading `/` (anchored at the walk root). Negations
//! (`!pattern`) are parsed but never match.

use globset::{GlobBuilder, GlobMatcher};
use std::path::Path;

pub const GITIGNORE_FILE: &str = ".gitignore";

#[derive(Debug, Clone)]
pub struct PatternRule {
    raw: String,
    body: String,
    dir_only: bool,
    anchored: bool,
    negated: bool,
    matcher: Option<GlobMatcher>,
}

impl PatternRule {
    /// Parses one rule. Blank lines and `#` comments yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let negated = trimmed.starts_with('!');
        let mut body = trimmed.trim_start_matches('!');
        let dir_only = body.len() > 1 && body.ends_with('/');
        body = body.trim_end_matches('/');
        let anchored = body.starts_with('/');
        body = body.trim_start_matches('/');
        if body.is_empty() {
            return None;
        }

        Some(Self {
            raw: trimmed.to_string(),
            body: body.to_string(),
            dir_only,
            anchored,
            negated,
            matcher: compile(body),
        })
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Tests a root-relative, `/`-separated path.
    #[must_use]
    pub fn matches(&self, rel_path: &str, is_dir: bool) -> bool {
        if self.negated || (self.dir_only && !is_dir) {
            return false;
        }
        if self.anchored || self.body.contains('/') {
            return self.matches_text(rel_path);
        }
        let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
        self.matches_text(name)
    }

    fn matches_text(&self, text: &str) -> bool {
        match &self.matcher {
            Some(m) => m.is_match(text),
            None => text == self.body,
        }
    }
}

fn compile(body: &str) -> Option<GlobMatcher> {
    if !body.contains(['*', '?', '[']) {
        return None;
    }
    match GlobBuilder::new(body).literal_separator(true).build() {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            tracing::debug!(pattern = body, error = %e, "pattern is not a valid glob, matching literally");
            None
        }
    }
}

/// An ordered collection of rules; any match wins.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    rules: Vec<PatternRule>,
}

impl PatternSet {
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: patterns
                .into_iter()
                .filter_map(|p| PatternRule::parse(p.as_ref()))
                .collect(),
        }
    }

    /// Loads `.gitignore` from `root`. Missing or unreadable files yield an empty set.
    #[must_use]
    pub fn load_gitignore(root: &Path) -> Self {
        let path = root.join(GITIGNORE_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let set = Self::new(content.lines());
                tracing::debug!(rules = set.len(), "loaded {}", path.display());
                set
            }
            Err(_) => Self::default(),
        }
    }

    #[must_use]
    pub fn is_match(&self, rel_path: &str, is_dir: bool) -> bool {
        self.rules.iter().any(|r| r.matches(rel_path, is_dir))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Normalizes a path to use forward slashes (cross-platform pattern matching).
#[must_use]
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(p: &str) -> PatternRule {
        PatternRule::parse(p).unwrap()
    }

    #[test]
    fn test_exact_and_wildcards() {
        let cases = [
            ("vendor", "vendor", true, true),
            ("vendor", "src/vendor", true, true),
            ("vendor", "vendors", true, false),
            ("*.pyc", "pkg/mod.pyc", false, true),
            ("test_*", "test_parser.py", false, true),
            ("*generated*", "src/api_generated_v2.go", false, true),
            ("*", "anything.rs", false, true),
            ("*.go", "main.py", false, false),
        ];
        for (pattern, path, is_dir, expected) in cases {
            assert_eq!(rule(pattern).matches(path, is_dir), expected, "{pattern} vs {path}");
        }
    }

    #[test]
    fn test_directory_only() {
        let r = rule("build/");
        assert!(r.matches("build", true));
        assert!(r.matches("sub/build", true));
        assert!(!r.matches("build", false));
    }

    #[test]
    fn test_anchored() {
        let r = rule("/docs");
        assert!(r.matches("docs", true));
        assert!(!r.matches("src/docs", true));

        let nested = rule("/src/*.py");
        assert!(nested.matches("src/a.py", false));
        assert!(!nested.matches("src/deep/a.py", false));
    }

    #[test]
    fn test_negation_never_matches() {
        let r = rule("!keep.py");
        assert!(!r.matches("keep.py", false));
        assert!(!r.matches("other.py", false));
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let set = PatternSet::new(["# comment", "", "   ", "*.log"]);
        assert_eq!(set.len(), 1);
        assert!(set.is_match("app.log", false));
    }

    #[test]
    fn test_load_gitignore() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(GITIGNORE_FILE), "generated/\n/scratch.py\n").unwrap();
        let set = PatternSet::load_gitignore(dir.path());
        assert!(set.is_match("generated", true));
        assert!(set.is_match("scratch.py", false));
        assert!(!set.is_match("lib/scratch.py", false));
    }
}
