// src/lib.rs
//! Concurrent multi-language static analysis.
//!
//! Files are discovered by a [`walker::FileWalker`], parsed in parallel by
//! the [`engine::Engine`]'s worker pool, enriched by the
//! [`metrics::MetricsCalculator`] and folded into one
//! [`types::EnhancedProjectAnalysis`] by [`aggregate::aggregate`].

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod exit;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod patterns;
pub mod registry;
pub mod types;
pub mod walker;

pub use config::Config;
pub use engine::{Engine, StopSignal};
pub use error::{GaugeError, Result};
pub use registry::ParserRegistry;
