// src/aggregate/graph.rs
//! Cycle detection and dependency depth over the internal-dependency map.
//!
//! Both walks are depth-first and bounded: recursion stops at [`MAX_DEPTH`]
//! and a single walk never expands more than [`MAX_NODES`] nodes.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;

pub type Adjacency = BTreeMap<String, Vec<String>>;

/// Deepest recursion a single walk may reach.
pub const MAX_DEPTH: usize = 1_000;
/// Most node expansions a single walk may perform.
pub const MAX_NODES: usize = 10_000;

/// Finds circular dependencies.
///
/// Each cycle starts and ends with the same node and has at least two distinct
/// nodes, so self-imports are ignored. At most one cycle is reported per DFS root.
#[must_use]
pub fn detect_cycles(adjacency: &Adjacency) -> Vec<Vec<String>> {
    let mut state = DfsState::default();

    // BTreeMap keys are already sorted, which keeps the output deterministic.
    for node in adjacency.keys() {
        if state.visited.contains(node.as_str()) {
            continue;
        }
        if state.expanded >= MAX_NODES {
            tracing::warn!(limit = MAX_NODES, "cycle search stopped at node limit");
            break;
        }
        state.root_has_cycle = false;
        dfs(node, adjacency, &mut state);
    }
    state.cycles
}

#[derive(Default)]
struct DfsState<'a> {
    visited: HashSet<&'a str>,
    recursion_stack: HashSet<&'a str>,
    path_stack: Vec<&'a str>,
    cycles: Vec<Vec<String>>,
    root_has_cycle: bool,
    expanded: usize,
}

fn dfs<'a>(node: &'a str, adjacency: &'a Adjacency, state: &mut DfsState<'a>) {
    if state.path_stack.len() >= MAX_DEPTH || state.expanded >= MAX_NODES {
        return;
    }
    state.expanded += 1;
    state.visited.insert(node);
    state.recursion_stack.insert(node);
    state.path_stack.push(node);

    if let Some(neighbors) = adjacency.get(node) {
        let mut sorted: Vec<&str> = neighbors.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();
        for neighbor in sorted {
            if neighbor == node {
                continue;
            }
            if !state.visited.contains(neighbor) {
                dfs(neighbor, adjacency, state);
            } else if state.recursion_stack.contains(neighbor) {
                record_cycle(neighbor, state);
            }
        }
    }

    state.recursion_stack.remove(node);
    state.path_stack.pop();
}

#[allow(clippy::indexing_slicing)] // pos comes from position()
fn record_cycle(neighbor: &str, state: &mut DfsState<'_>) {
    if state.root_has_cycle {
        return;
    }
    if let Some(pos) = state.path_stack.iter().position(|x| *x == neighbor) {
        let mut cycle: Vec<String> = state.path_stack[pos..].iter().map(|s| (*s).to_string()).collect();
        cycle.push(neighbor.to_string());
        state.cycles.push(cycle);
        state.root_has_cycle = true;
    }
}

/// Longest dependency chain starting at any node. Empty maps have depth 0.
#[must_use]
pub fn max_depth(adjacency: &Adjacency) -> usize {
    adjacency
        .par_iter()
        .map(|(node, _)| node_depth(node, adjacency))
        .max()
        .unwrap_or(0)
}

/// Longest path from `node`, never revisiting a node already on the path.
#[must_use]
pub fn node_depth(node: &str, adjacency: &Adjacency) -> usize {
    let mut walk = DepthWalk {
        adjacency,
        on_path: HashSet::new(),
        expanded: 0,
    };
    walk.depth(node, 0)
}

struct DepthWalk<'a> {
    adjacency: &'a Adjacency,
    on_path: HashSet<&'a str>,
    expanded: usize,
}

impl<'a> DepthWalk<'a> {
    fn depth(&mut self, node: &'a str, level: usize) -> usize {
        if level >= MAX_DEPTH || self.expanded >= MAX_NODES {
            return 0;
        }
        self.expanded += 1;
        let Some(neighbors) = self.adjacency.get(node) else {
            return 0;
        };

        self.on_path.insert(node);
        let mut best = 0;
        for neighbor in neighbors {
            if self.on_path.contains(neighbor.as_str()) {
                continue;
            }
            best = best.max(1 + self.depth(neighbor, level + 1));
        }
        self.on_path.remove(node);
        best
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> Adjacency {
        edges
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.iter().map(|s| (*s).to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_cycle_detection_logic() {
        let cases: Vec<(Adjacency, usize, &str)> = vec![
            (graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]), 0, "chain"),
            (graph(&[("a", &["b"]), ("b", &["a"])]), 1, "two-node cycle"),
            (graph(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]), 1, "three-node cycle"),
            (graph(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &["d"])]), 0, "diamond"),
            (graph(&[("a", &["a"])]), 0, "self loop"),
            (graph(&[("a", &["b"]), ("b", &["a"]), ("c", &["d"]), ("d", &["c"])]), 2, "disjoint cycles"),
            (graph(&[]), 0, "empty"),
        ];
        for (adjacency, expected, desc) in cases {
            assert_eq!(detect_cycles(&adjacency).len(), expected, "{desc}");
        }
    }

    #[test]
    fn test_cycle_shape() {
        let cycles = detect_cycles(&graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])]));
        let cycle = &cycles[0];
        assert_eq!(cycle, &vec!["A", "B", "C", "A"]);
        assert_eq!(cycle.first(), cycle.last());
        let distinct: HashSet<_> = cycle.iter().collect();
        assert!(distinct.len() >= 2);
    }

    #[test]
    fn test_one_cycle_per_root() {
        // Figure eight through b: both loops are reachable from the same root.
        let adjacency = graph(&[("a", &["b"]), ("b", &["a", "c"]), ("c", &["b"])]);
        assert_eq!(detect_cycles(&adjacency).len(), 1);
    }

    #[test]
    fn test_depth() {
        assert_eq!(max_depth(&Adjacency::new()), 0);

        let chain = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["D"])]);
        assert_eq!(max_depth(&chain), 3);
        assert_eq!(node_depth("B", &chain), 2);

        // Cycles terminate and contribute nothing for the back edge.
        let cyclic = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])]);
        assert_eq!(max_depth(&cyclic), 2);
    }

    #[test]
    fn test_long_chain_is_bounded() {
        let names: Vec<String> = (0..MAX_DEPTH + 50).map(|i| format!("n{i:05}")).collect();
        let adjacency: Adjacency = names
            .windows(2)
            .map(|w| (w[0].clone(), vec![w[1].clone()]))
            .collect();
        assert!(node_depth(&names[0], &adjacency) <= MAX_DEPTH);
        assert!(detect_cycles(&adjacency).is_empty());
    }

    #[test]
    fn test_repeatable() {
        let adjacency = graph(&[("x", &["y"]), ("y", &["z"]), ("z", &["x"]), ("w", &["x"])]);
        assert_eq!(detect_cycles(&adjacency), detect_cycles(&adjacency));
        assert_eq!(max_depth(&adjacency), max_depth(&adjacency));
    }
}
