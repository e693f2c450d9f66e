// src/registry.rs
//! Maps file extensions to parser instances.
//!
//! The registry is owned by whoever builds the engine and is passed around by
//! reference. Lookups take a shared lock; registration takes an exclusive one.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{GaugeError, Result};
use crate::parser::{GoParser, Parser, PythonParser, RustParser};

#[derive(Default)]
pub struct ParserRegistry {
    parsers: RwLock<HashMap<String, Arc<dyn Parser>>>,
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("extensions", &self.list_extensions())
            .finish()
    }
}

impl ParserRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in Python, Rust and Go parsers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        let builtins: [Arc<dyn Parser>; 3] = [
            Arc::new(PythonParser::new()),
            Arc::new(RustParser::new()),
            Arc::new(GoParser::new()),
        ];
        for parser in builtins {
            // Built-ins always declare extensions.
            if let Err(e) = registry.register(parser) {
                tracing::warn!(error = %e, "skipping built-in parser");
            }
        }
        registry
    }

    /// Registers `parser` for every extension it declares. The last
    /// registration for an extension wins.
    ///
    /// # Errors
    /// Returns `InvalidParser` if the parser declares no extensions.
    pub fn register(&self, parser: Arc<dyn Parser>) -> Result<()> {
        let extensions: Vec<String> = parser
            .supported_extensions()
            .iter()
            .filter_map(|e| normalize_extension(e))
            .collect();
        if extensions.is_empty() {
            return Err(GaugeError::InvalidParser {
                language: parser.language_name().to_string(),
                reason: "parser declares no file extensions".into(),
            });
        }

        let mut map = self.parsers.write();
        for ext in extensions {
            if let Some(previous) = map.insert(ext.clone(), Arc::clone(&parser)) {
                tracing::debug!(
                    extension = %ext,
                    old = previous.language_name(),
                    new = parser.language_name(),
                    "replacing parser"
                );
            }
        }
        Ok(())
    }

    /// Finds the parser for `path` by its extension.
    ///
    /// # Errors
    /// Returns `UnsupportedExtension` if nothing is registered for it.
    pub fn resolve(&self, path: &Path) -> Result<Arc<dyn Parser>> {
        let extension = path
            .extension()
            .and_then(|e| normalize_extension(&e.to_string_lossy()))
            .unwrap_or_default();
        self.parsers
            .read()
            .get(&extension)
            .cloned()
            .ok_or_else(|| GaugeError::UnsupportedExtension {
                extension,
                path: path.to_path_buf(),
            })
    }

    #[must_use]
    pub fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| normalize_extension(&e.to_string_lossy()))
            .is_some_and(|ext| self.parsers.read().contains_key(&ext))
    }

    /// Registered extensions, sorted.
    #[must_use]
    pub fn list_extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.parsers.read().keys().cloned().collect();
        exts.sort();
        exts
    }

    /// Distinct language names, sorted.
    #[must_use]
    pub fn list_languages(&self) -> Vec<String> {
        self.parsers
            .read()
            .values()
            .map(|p| p.language_name().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parsers.read().is_empty()
    }
}

/// `PY`, `py` and `.py` all become `.py`.
fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnalysisResult;
    use std::thread;

    struct Fake {
        name: &'static str,
        exts: Vec<&'static str>,
    }

    impl Parser for Fake {
        fn parse(&self, path: &Path, _content: &[u8]) -> Result<AnalysisResult> {
            Ok(AnalysisResult::new(path, self.name))
        }
        fn supported_extensions(&self) -> Vec<String> {
            self.exts.iter().map(|s| (*s).to_string()).collect()
        }
        fn language_name(&self) -> &str {
            self.name
        }
    }

    #[test]
    fn test_register_normalizes_extensions() {
        let registry = ParserRegistry::new();
        registry
            .register(Arc::new(Fake { name: "Fake", exts: vec!["FK", ".Fkx"] }))
            .unwrap();
        assert_eq!(registry.list_extensions(), vec![".fk", ".fkx"]);
        assert!(registry.supports(Path::new("src/a.FK")));
        assert!(registry.supports(Path::new("b.fkx")));
    }

    #[test]
    fn test_zero_extensions_rejected() {
        let registry = ParserRegistry::new();
        let err = registry
            .register(Arc::new(Fake { name: "Empty", exts: vec![] }))
            .unwrap_err();
        assert!(matches!(err, GaugeError::InvalidParser { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = ParserRegistry::new();
        registry.register(Arc::new(Fake { name: "Old", exts: vec![".x"] })).unwrap();
        registry.register(Arc::new(Fake { name: "New", exts: vec![".x"] })).unwrap();
        let parser = registry.resolve(Path::new("f.x")).unwrap();
        assert_eq!(parser.language_name(), "New");
        assert_eq!(registry.list_languages(), vec!["New"]);
    }

    #[test]
    fn test_resolve_unsupported() {
        let registry = ParserRegistry::with_defaults();
        let err = registry.resolve(Path::new("README.md")).err().unwrap();
        assert!(matches!(err, GaugeError::UnsupportedExtension { ref extension, .. } if extension == ".md"));
        assert!(registry.resolve(Path::new("Makefile")).is_err());
    }

    #[test]
    fn test_defaults() {
        let registry = ParserRegistry::with_defaults();
        assert_eq!(registry.list_languages(), vec!["Go", "Python", "Rust"]);
        assert!(registry.supports(Path::new("main.go")));
        assert!(registry.supports(Path::new("stubs.pyi")));
    }

    #[test]
    fn test_concurrent_register_and_resolve() {
        let registry = Arc::new(ParserRegistry::with_defaults());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    if i % 2 == 0 {
                        registry
                            .register(Arc::new(Fake { name: "Fake", exts: vec![".fk"] }))
                            .unwrap();
                    }
                    assert!(registry.resolve(Path::new("a.py")).is_ok());
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(registry.supports(Path::new("x.fk")));
    }
}
