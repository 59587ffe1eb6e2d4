//! Repair ordering and batching

use std::collections::HashSet;

use crate::graph::DependencyGraph;

/// Order `affected` modules so dependencies are repaired before dependents.
///
/// Modules Kahn's algorithm can place come first in that order; the rest
/// (on or behind a cycle, or unknown to the graph) follow in their original
/// order.
pub fn order_modules(graph: &DependencyGraph, affected: &[String]) -> Vec<String> {
    let wanted: HashSet<&str> = affected.iter().map(String::as_str).collect();
    let mut placed = HashSet::new();

    let mut ordered: Vec<String> = graph
        .acyclic_prefix()
        .into_iter()
        .filter(|name| wanted.contains(name.as_str()))
        .inspect(|name| {
            placed.insert(name.clone());
        })
        .collect();

    for name in affected {
        if placed.insert(name.clone()) {
            ordered.push(name.clone());
        }
    }

    ordered
}

/// Split `modules` into consecutive batches of at most `size`
pub fn batches(modules: &[String], size: usize) -> Vec<Vec<String>> {
    modules
        .chunks(size.max(1))
        .map(<[String]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_dependencies_first() {
        let mut graph = DependencyGraph::new();
        graph.add_or_update("A", ["B"]);
        graph.add_or_update("B", ["C"]);
        graph.add_or_update("C", Vec::<String>::new());

        let ordered = order_modules(&graph, &names(&["A", "C", "B"]));
        assert_eq!(ordered, names(&["C", "B", "A"]));
    }

    #[test]
    fn test_cyclic_modules_appended_in_issue_order() {
        let mut graph = DependencyGraph::new();
        graph.add_or_update("X", ["Y"]);
        graph.add_or_update("Y", ["X"]);
        graph.add_or_update("Z", ["Leaf"]);
        graph.add_or_update("Leaf", Vec::<String>::new());

        let ordered = order_modules(&graph, &names(&["Y", "Z", "X", "Leaf"]));
        assert_eq!(ordered, names(&["Leaf", "Z", "Y", "X"]));
    }

    #[test]
    fn test_unknown_modules_kept() {
        let graph = DependencyGraph::new();
        let ordered = order_modules(&graph, &names(&["Broken", "A", "Broken"]));
        assert_eq!(ordered, names(&["Broken", "A"]));
    }

    #[test]
    fn test_batches() {
        let modules = names(&["a", "b", "c", "d", "e"]);
        let batches = batches(&modules, 2);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2], names(&["e"]));

        assert_eq!(super::batches(&modules, 0).len(), 5);
    }
}
