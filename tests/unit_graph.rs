// tests/unit_graph.rs
//! Dependency graph and quality score properties through the public API.

use codegauge_core::aggregate::graph::{detect_cycles, max_depth, Adjacency};
use codegauge_core::aggregate::{grade_for, quality_score, QualityInputs};
use codegauge_core::types::Grade;
use std::collections::HashSet;

fn graph(edges: &[(&str, &[&str])]) -> Adjacency {
    edges
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.iter().map(|s| (*s).to_string()).collect()))
        .collect()
}

#[test]
fn test_three_node_cycle_found() {
    let cycles = detect_cycles(&graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])]));
    assert!(!cycles.is_empty());
    let cycle = &cycles[0];
    assert_eq!(cycle.first(), cycle.last());
    let distinct: HashSet<&String> = cycle.iter().collect();
    assert_eq!(distinct.len(), 3);
}

#[test]
fn test_acyclic_chain_has_no_cycles() {
    let cycles = detect_cycles(&graph(&[("A", &["B"]), ("B", &["C"]), ("C", &[])]));
    assert!(cycles.is_empty());
}

#[test]
fn test_chain_depth() {
    let chain = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["D"])]);
    assert!(max_depth(&chain) >= 3);
    assert_eq!(max_depth(&Adjacency::new()), 0);
}

#[test]
fn test_every_cycle_is_closed() {
    let adjacency = graph(&[
        ("a", &["b"]),
        ("b", &["c", "a"]),
        ("c", &["d"]),
        ("d", &["b"]),
        ("x", &["y"]),
        ("y", &["x"]),
    ]);
    for cycle in detect_cycles(&adjacency) {
        assert_eq!(cycle.first(), cycle.last());
        assert!(cycle.iter().collect::<HashSet<_>>().len() >= 2);
    }
}

#[test]
fn test_grade_boundaries() {
    assert_eq!(grade_for(90.0), Grade::A);
    assert_eq!(grade_for(89.9), Grade::B);
}

#[test]
fn test_documented_simple_project_score() {
    let inputs = QualityInputs {
        maintainability: 100.0,
        average_complexity: 1.0,
        documentation: 100.0,
        test_coverage: 0.0,
        duplication: 0.0,
    };
    let q = quality_score(inputs);
    assert!((q.score - 61.25).abs() < 1e-9);
    assert_eq!(q.grade, Grade::D);
}

#[test]
fn test_complexity_term_grows_with_average() {
    let base = QualityInputs {
        maintainability: 70.0,
        average_complexity: 2.0,
        documentation: 50.0,
        ..QualityInputs::default()
    };
    let higher = QualityInputs {
        average_complexity: 12.0,
        ..base
    };
    // 21 + 2.5 + 10 + 0 + 10 versus 21 + 15 + 10 + 0 + 10
    assert!((quality_score(base).score - 43.5).abs() < 1e-9);
    assert!((quality_score(higher).score - 56.0).abs() < 1e-9);
}
