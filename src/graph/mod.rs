//! Entity Dependency Graph
//!
//! Singular entity name → set of referenced singular entity names, built from
//! the structured references collected during first-pass emission.
//!
//! The map is the source of truth for cycle detection. A petgraph view is
//! built on demand for GraphViz export and strongly connected component
//! summaries.

pub mod cycles;

pub use cycles::{detect_circular_dependencies, is_circular_dependency, CycleSet};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::codegen::{ArtifactSet, Reference};

// =============================================================================
// Dependency Graph
// =============================================================================

/// Directed entity reference graph. An entity without outgoing references
/// is not a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Build from first-pass artifacts. Self-references, shared definitions
    /// and targets without an artifact are not edges.
    pub fn from_artifacts(artifacts: &ArtifactSet) -> Self {
        let mut graph = Self::default();
        for artifact in artifacts.iter() {
            for reference in artifact.references() {
                let Reference::Entity(target) = reference else {
                    continue;
                };
                if target == artifact.type_name() || artifacts.by_type_name(&target).is_none() {
                    continue;
                }
                graph.add_edge(artifact.type_name(), &target);
            }
        }
        graph
    }

    /// Build from explicit `(from, to)` pairs
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut graph = Self::default();
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Outgoing references of an entity
    pub fn references(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    /// Entities with outgoing references, sorted
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.edges.keys()
    }

    /// Every entity appearing on either end of an edge
    pub fn nodes(&self) -> BTreeSet<&str> {
        self.edges
            .iter()
            .flat_map(|(from, targets)| {
                std::iter::once(from.as_str()).chain(targets.iter().map(String::as_str))
            })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Project into a petgraph graph
    fn to_petgraph(&self) -> (DiGraph<String, ()>, HashMap<&str, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();
        for node in self.nodes() {
            indices.insert(node, graph.add_node(node.to_string()));
        }
        for (from, targets) in &self.edges {
            for to in targets {
                if let (Some(&a), Some(&b)) = (indices.get(from.as_str()), indices.get(to.as_str())) {
                    graph.add_edge(a, b, ());
                }
            }
        }
        (graph, indices)
    }

    /// Groups of mutually reachable entities (more than one member)
    pub fn scc_groups(&self) -> Vec<SccGroup> {
        let (graph, _) = self.to_petgraph();
        let mut groups: Vec<Vec<String>> = kosaraju_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut members: Vec<String> = scc
                    .iter()
                    .filter_map(|idx| graph.node_weight(*idx).cloned())
                    .collect();
                members.sort();
                members
            })
            .collect();
        groups.sort();

        groups
            .into_iter()
            .enumerate()
            .map(|(id, members)| SccGroup { id, members })
            .collect()
    }

    /// Export as GraphViz DOT
    pub fn to_dot(&self) -> String {
        let (graph, _) = self.to_petgraph();
        let mut output = String::new();

        output.push_str("digraph EntityGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10, fillcolor=\"#00BCD4\"];\n");
        output.push('\n');

        for idx in graph.node_indices() {
            output.push_str(&format!("  \"{}\";\n", graph[idx]));
        }

        output.push('\n');

        for edge in graph.edge_references() {
            output.push_str(&format!(
                "  \"{}\" -> \"{}\";\n",
                graph[edge.source()],
                graph[edge.target()]
            ));
        }

        output.push_str("}\n");
        output
    }
}

/// A strongly connected component (mutual reference group)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SccGroup {
    pub id: usize,
    /// Members, sorted
    pub members: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_only_for_referencing_entities() {
        let graph = DependencyGraph::from_edges([("Post", "User"), ("Comment", "Post")]);
        assert!(graph.contains_key("Post"));
        assert!(!graph.contains_key("User"));
        assert_eq!(graph.nodes().len(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_scc_groups() {
        let graph = DependencyGraph::from_edges([
            ("User", "Post"),
            ("Post", "User"),
            ("Comment", "Post"),
        ]);
        let groups = graph.scc_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec!["Post", "User"]);
    }

    #[test]
    fn test_to_dot() {
        let graph = DependencyGraph::from_edges([("Post", "User")]);
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph EntityGraph {"));
        assert!(dot.contains("\"Post\" -> \"User\";"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
