// src/walker.rs
//! Directory traversal with exclude, include, gitignore and size filtering.

use std::collections::BTreeMap;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{GaugeError, Result};
use crate::parser::Parser;
use crate::patterns::{normalize_path, PatternSet};
use crate::registry::ParserRegistry;

/// A file that passed every filter, paired with the parser that will handle it.
#[derive(Clone)]
pub struct Discovered {
    pub path: PathBuf,
    pub size: u64,
    pub parser: Arc<dyn Parser>,
}

impl std::fmt::Debug for Discovered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discovered")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("language", &self.parser.language_name())
            .finish()
    }
}

/// Counts gathered by [`FileWalker::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    pub total_files: usize,
    pub by_extension: BTreeMap<String, usize>,
    pub excluded: usize,
    pub oversize: usize,
    pub unsupported: usize,
    pub errors: usize,
}

enum Visit {
    Found(Discovered),
    Excluded,
    Oversize,
    Unsupported,
    Failed(GaugeError),
}

pub struct FileWalker<'a> {
    root: PathBuf,
    registry: &'a ParserRegistry,
    excludes: PatternSet,
    includes: PatternSet,
    gitignore: PatternSet,
    max_file_size: u64,
}

impl<'a> FileWalker<'a> {
    /// Builds a walker rooted at `root`. The root's `.gitignore` is read once here.
    #[must_use]
    pub fn new(root: &Path, config: &Config, registry: &'a ParserRegistry) -> Self {
        let gitignore = if config.respect_gitignore {
            PatternSet::load_gitignore(root)
        } else {
            PatternSet::default()
        };
        Self {
            root: root.to_path_buf(),
            registry,
            excludes: PatternSet::new(&config.exclude_patterns),
            includes: PatternSet::new(&config.include_patterns),
            gitignore,
            max_file_size: config.max_file_size,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yields accepted files. Traversal errors come through as `Err`
    /// entries and do not end the walk. Each call starts a fresh traversal.
    pub fn walk(&self) -> impl Iterator<Item = Result<Discovered>> + '_ {
        self.visits().filter_map(|visit| match visit {
            Visit::Found(d) => Some(Ok(d)),
            Visit::Failed(e) => Some(Err(e)),
            Visit::Excluded | Visit::Oversize | Visit::Unsupported => None,
        })
    }

    /// Runs the walk without analysis and tallies what it saw.
    #[must_use]
    pub fn stats(&self) -> WalkStats {
        let mut stats = WalkStats::default();
        for visit in self.visits() {
            match visit {
                Visit::Found(d) => {
                    stats.total_files += 1;
                    let ext = d
                        .path
                        .extension()
                        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                        .unwrap_or_default();
                    *stats.by_extension.entry(ext).or_default() += 1;
                }
                Visit::Excluded => stats.excluded += 1,
                Visit::Oversize => stats.oversize += 1,
                Visit::Unsupported => stats.unsupported += 1,
                Visit::Failed(_) => stats.errors += 1,
            }
        }
        tracing::debug!(?stats, root = %self.root.display(), "walk stats");
        stats
    }

    fn visits(&self) -> Visits<'_> {
        Visits {
            walker: self,
            inner: WalkDir::new(&self.root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter(),
        }
    }

    fn is_excluded(&self, rel: &str, is_dir: bool) -> bool {
        self.excludes.is_match(rel, is_dir) || self.gitignore.is_match(rel, is_dir)
    }

    /// Classifies one non-directory entry. `target` yields the metadata of the
    /// file the entry resolves to; `None` means it is not a regular file.
    fn classify<M>(&self, path: &Path, target: M) -> Option<Visit>
    where
        M: FnOnce() -> std::io::Result<Metadata>,
    {
        let rel = relative(&self.root, path);
        if self.is_excluded(&rel, false) {
            return Some(Visit::Excluded);
        }
        if !self.includes.is_empty() && !self.includes.is_match(&rel, false) {
            return Some(Visit::Excluded);
        }

        let meta = match target() {
            Ok(meta) => meta,
            Err(e) => {
                return Some(Visit::Failed(GaugeError::Walk {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }))
            }
        };
        if !meta.is_file() {
            return None;
        }
        let size = meta.len();
        if size > self.max_file_size {
            tracing::debug!(path = %path.display(), size, "skipping over-size file");
            return Some(Visit::Oversize);
        }

        Some(match self.registry.resolve(path) {
            Ok(parser) => Visit::Found(Discovered {
                path: path.to_path_buf(),
                size,
                parser,
            }),
            Err(_) => Visit::Unsupported,
        })
    }
}

struct Visits<'w> {
    walker: &'w FileWalker<'w>,
    inner: walkdir::IntoIter,
}

impl Iterator for Visits<'_> {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Visit::Failed(e.into())),
            };

            if entry.file_type().is_dir() {
                if entry.depth() == 0 {
                    continue;
                }
                let rel = relative(&self.walker.root, entry.path());
                if self.walker.is_excluded(&rel, true) {
                    tracing::debug!(dir = %rel, "pruning excluded directory");
                    self.inner.skip_current_dir();
                    return Some(Visit::Excluded);
                }
                continue;
            }
            let file_type = entry.file_type();
            let visit = if file_type.is_symlink() {
                // Links are not followed for traversal; a link to a file is
                // analyzed under the link's own path.
                let path = entry.path();
                self.walker.classify(path, || {
                    fs::metadata(path)
                        .map_err(|e| std::io::Error::new(e.kind(), format!("broken symlink: {e}")))
                })
            } else if file_type.is_file() {
                self.walker
                    .classify(entry.path(), || entry.metadata().map_err(std::io::Error::from))
            } else {
                None
            };
            if let Some(visit) = visit {
                return Some(visit);
            }
        }
    }
}

/// Root-relative path with `/` separators. The root itself maps to its file name.
fn relative(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => normalize_path(rel),
        _ => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/pkg")).unwrap();
        fs::create_dir_all(root.join("vendor/lib")).unwrap();
        fs::write(root.join("src/main.py"), "print('hi')\n").unwrap();
        fs::write(root.join("src/pkg/util.go"), "package pkg\n").unwrap();
        fs::write(root.join("src/notes.md"), "# notes\n").unwrap();
        fs::write(root.join("vendor/lib/dep.py"), "x = 1\n").unwrap();
        dir
    }

    fn paths(walker: &FileWalker<'_>) -> Vec<String> {
        walker
            .walk()
            .map(|r| relative(walker.root(), &r.unwrap().path))
            .collect()
    }

    #[test]
    fn test_default_walk_prunes_vendor() {
        let dir = fixture();
        let registry = ParserRegistry::with_defaults();
        let walker = FileWalker::new(dir.path(), &Config::default(), &registry);
        assert_eq!(paths(&walker), vec!["src/main.py", "src/pkg/util.go"]);
    }

    #[test]
    fn test_walk_is_restartable() {
        let dir = fixture();
        let registry = ParserRegistry::with_defaults();
        let walker = FileWalker::new(dir.path(), &Config::default(), &registry);
        assert_eq!(paths(&walker), paths(&walker));
    }

    #[test]
    fn test_include_allow_list() {
        let dir = fixture();
        let registry = ParserRegistry::with_defaults();
        let config = Config {
            include_patterns: vec!["*.go".into()],
            ..Config::default()
        };
        let walker = FileWalker::new(dir.path(), &config, &registry);
        assert_eq!(paths(&walker), vec!["src/pkg/util.go"]);
    }

    #[test]
    fn test_size_ceiling() {
        let dir = fixture();
        fs::write(dir.path().join("src/big.py"), "x = 1\n".repeat(100)).unwrap();
        let registry = ParserRegistry::with_defaults();
        let config = Config {
            max_file_size: 64,
            ..Config::default()
        };
        let walker = FileWalker::new(dir.path(), &config, &registry);
        let stats = walker.stats();
        assert_eq!(stats.oversize, 1);
        assert!(!paths(&walker).contains(&"src/big.py".to_string()));
    }

    #[test]
    fn test_gitignore_rules() {
        let dir = fixture();
        fs::write(dir.path().join(".gitignore"), "pkg/\n").unwrap();
        let registry = ParserRegistry::with_defaults();
        let walker = FileWalker::new(dir.path(), &Config::default(), &registry);
        assert_eq!(paths(&walker), vec!["src/main.py"]);
    }

    #[test]
    fn test_stats() {
        let dir = fixture();
        let registry = ParserRegistry::with_defaults();
        let walker = FileWalker::new(dir.path(), &Config::default(), &registry);
        let stats = walker.stats();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.by_extension.get(".py"), Some(&1));
        assert_eq!(stats.by_extension.get(".go"), Some(&1));
        // vendor/ directory
        assert_eq!(stats.excluded, 1);
        // notes.md
        assert_eq!(stats.unsupported, 1);
        assert_eq!(stats.errors, 0);
    }

    #[test]
    fn test_missing_root_reports_error() {
        let registry = ParserRegistry::with_defaults();
        let walker = FileWalker::new(Path::new("/definitely/not/here"), &Config::default(), &registry);
        let results: Vec<_> = walker.walk().collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_resolved_or_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("real.py"), "x = 1\n").unwrap();
        std::os::unix::fs::symlink("/no/such/target.py", dir.path().join("dangling.py")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.py"), dir.path().join("alias.py")).unwrap();

        let registry = ParserRegistry::with_defaults();
        let walker = FileWalker::new(dir.path(), &Config::default(), &registry);
        let (ok, errors): (Vec<_>, Vec<_>) = walker.walk().partition(|r| r.is_ok());
        let found: Vec<String> = ok
            .into_iter()
            .map(|r| relative(walker.root(), &r.unwrap().path))
            .collect();
        assert_eq!(found, vec!["alias.py", "real.py"]);

        assert_eq!(errors.len(), 1);
        let err = errors.into_iter().next().unwrap().unwrap_err();
        assert!(matches!(&err, GaugeError::Walk { path, .. } if path.ends_with("dangling.py")));

        let stats = walker.stats();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.errors, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_excluded_dangling_link_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink("/no/such/target.py", dir.path().join("gone.py")).unwrap();
        let registry = ParserRegistry::with_defaults();
        let config = Config {
            exclude_patterns: vec!["gone.py".into()],
            ..Config::default()
        };
        let walker = FileWalker::new(dir.path(), &config, &registry);
        assert_eq!(walker.walk().count(), 0);
        assert_eq!(walker.stats().excluded, 1);
    }
}
