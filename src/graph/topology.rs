//! Topological ordering using Kahn's algorithm
//!
//! Dependencies come first. Among nodes that become ready at the same time
//! the lexicographically smallest is emitted first, so the order is stable
//! for a given graph.

use std::collections::{BTreeMap, BTreeSet};

use super::DependencyGraph;

/// Run Kahn's algorithm.
///
/// Returns the processed prefix and whether every node was placed.
pub(super) fn kahn(graph: &DependencyGraph) -> (Vec<String>, bool) {
    let mut remaining: BTreeMap<&str, usize> = graph
        .nodes
        .iter()
        .map(|(name, node)| (name.as_str(), node.depends_on.len()))
        .collect();

    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, node) in &graph.nodes {
        for dep in &node.depends_on {
            dependents.entry(dep.as_str()).or_default().push(name.as_str());
        }
    }

    let mut ready: BTreeSet<&str> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut order = Vec::with_capacity(graph.nodes.len());

    while let Some(name) = ready.pop_first() {
        order.push(name.to_string());

        for dependent in dependents.get(name).into_iter().flatten() {
            if let Some(count) = remaining.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    let complete = order.len() == graph.nodes.len();
    (order, complete)
}

pub(super) fn topological_order(graph: &DependencyGraph) -> Option<Vec<String>> {
    match kahn(graph) {
        (order, true) => Some(order),
        (_, false) => None,
    }
}
