//! Cycle Detection
//!
//! Depth-first traversal with an explicit path stack. Meeting a node that is
//! still on the stack closes a cycle: the path from that node's position
//! through the current node, with the node appended again.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use super::DependencyGraph;

/// Distinct closed reference paths, each ending where it started
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSet {
    cycles: Vec<Vec<String>>,
}

impl CycleSet {
    /// Record a path unless the identical path is already known
    fn record(&mut self, path: Vec<String>) {
        if !self.cycles.contains(&path) {
            self.cycles.push(path);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<String>> {
        self.cycles.iter()
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Whether an entity is part of any cycle
    pub fn contains(&self, name: &str) -> bool {
        self.cycles.iter().any(|c| c.iter().any(|n| n == name))
    }

    /// Every entity in some cycle
    pub fn entities(&self) -> BTreeSet<&str> {
        self.cycles
            .iter()
            .flat_map(|c| c.iter().map(String::as_str))
            .collect()
    }
}

/// Find every closed path in the graph
pub fn detect_circular_dependencies(graph: &DependencyGraph) -> CycleSet {
    let mut state = Traversal {
        graph,
        visited: HashSet::new(),
        on_stack: HashSet::new(),
        path: Vec::new(),
        cycles: CycleSet::default(),
    };

    for root in graph.keys() {
        if !state.visited.contains(root.as_str()) {
            state.visit(root);
        }
    }

    state.cycles
}

/// Whether some recorded cycle contains both entities
pub fn is_circular_dependency(a: &str, b: &str, cycles: &CycleSet) -> bool {
    cycles
        .iter()
        .any(|c| c.iter().any(|n| n == a) && c.iter().any(|n| n == b))
}

struct Traversal<'g> {
    graph: &'g DependencyGraph,
    visited: HashSet<&'g str>,
    on_stack: HashSet<&'g str>,
    path: Vec<&'g str>,
    cycles: CycleSet,
}

impl<'g> Traversal<'g> {
    fn visit(&mut self, node: &'g str) {
        self.visited.insert(node);
        self.on_stack.insert(node);
        self.path.push(node);

        if let Some(targets) = self.graph.references(node) {
            for next in targets {
                let next = next.as_str();
                if self.on_stack.contains(next) {
                    if let Some(start) = self.path.iter().position(|n| *n == next) {
                        let mut cycle: Vec<String> =
                            self.path[start..].iter().map(|n| n.to_string()).collect();
                        cycle.push(next.to_string());
                        self.cycles.record(cycle);
                    }
                } else if !self.visited.contains(next) {
                    self.visit(next);
                }
            }
        }

        self.path.pop();
        self.on_stack.remove(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_cycle() {
        let graph = DependencyGraph::from_edges([("User", "Post"), ("Post", "User")]);
        let cycles = detect_circular_dependencies(&graph);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles.iter().next().unwrap(), &vec!["Post", "User", "Post"]);
        assert!(is_circular_dependency("User", "Post", &cycles));
        assert!(is_circular_dependency("Post", "User", &cycles));
    }

    #[test]
    fn test_acyclic_graph() {
        let graph = DependencyGraph::from_edges([("Comment", "Post"), ("Post", "User")]);
        let cycles = detect_circular_dependencies(&graph);
        assert!(cycles.is_empty());
        assert!(!is_circular_dependency("Comment", "Post", &cycles));
    }

    #[test]
    fn test_three_cycle_and_bystander() {
        let graph = DependencyGraph::from_edges([
            ("A", "B"),
            ("B", "C"),
            ("C", "A"),
            ("D", "A"),
        ]);
        let cycles = detect_circular_dependencies(&graph);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles.iter().next().unwrap(), &vec!["A", "B", "C", "A"]);
        assert!(!cycles.contains("D"));
        assert!(is_circular_dependency("A", "C", &cycles));
        assert!(!is_circular_dependency("A", "D", &cycles));
    }

    #[test]
    fn test_cycle_closes_from_first_occurrence() {
        // X → Y → Z → Y: the cycle starts at Y, not at the root
        let graph = DependencyGraph::from_edges([("X", "Y"), ("Y", "Z"), ("Z", "Y")]);
        let cycles = detect_circular_dependencies(&graph);
        assert_eq!(cycles.iter().next().unwrap(), &vec!["Y", "Z", "Y"]);
        assert_eq!(cycles.entities().into_iter().collect::<Vec<_>>(), vec!["Y", "Z"]);
    }

    #[test]
    fn test_overlapping_cycles_are_kept() {
        let graph = DependencyGraph::from_edges([
            ("A", "B"),
            ("B", "A"),
            ("B", "C"),
            ("C", "A"),
        ]);
        let cycles = detect_circular_dependencies(&graph);
        assert_eq!(cycles.len(), 2);
        assert!(is_circular_dependency("C", "B", &cycles));
    }
}
