//! Module dependency graph
//!
//! The graph stores one authoritative edge set per node: `depends_on`.
//! The reverse relation (`depended_by`) is computed on demand so the two can
//! never disagree.
//!
//! Names referenced as dependencies but never defined are kept as
//! *placeholder* nodes. They take part in cycle detection and ordering, and
//! disappear again once nothing references them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use archfix::graph::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_or_update("A", ["B"]);
//! graph.add_or_update("B", ["C"]);
//! graph.add_or_update("C", Vec::<String>::new());
//!
//! assert_eq!(
//!     graph.topological_order(),
//!     Some(vec!["C".to_string(), "B".to_string(), "A".to_string()])
//! );
//! ```

mod cycles;
mod serialization;
mod topology;

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::Module;

pub use serialization::{GraphDocument, NodeRecord};

/// A directed cycle, listed in traversal order
pub type Cycle = Vec<String>;

static EMPTY: BTreeSet<String> = BTreeSet::new();

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Node {
    depends_on: BTreeSet<String>,
    placeholder: bool,
}

/// Outcome of a graph mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleCheck {
    /// Cycles reachable from the mutated node
    pub cycles: Vec<Cycle>,
}

impl CycleCheck {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// Directed graph over module names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, Node>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from a set of module records
    pub fn from_modules<'a, I>(modules: I) -> Self
    where
        I: IntoIterator<Item = &'a Module>,
    {
        let mut graph = Self::new();
        for module in modules {
            graph.insert_node(&module.name, module.depends_on.iter().cloned());
        }
        graph
    }

    /// Insert or replace the outgoing edges of `name`.
    ///
    /// Unknown dependencies become placeholder nodes. Returns the cycles
    /// reachable from `name` after the change.
    pub fn add_or_update<I, S>(&mut self, name: &str, depends_on: I) -> CycleCheck
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_node(name, depends_on.into_iter().map(Into::into));
        self.prune_placeholders();

        CycleCheck {
            cycles: self.find_cycles(Some(name)),
        }
    }

    /// Delete `name` and strip it from every other node's dependencies
    pub fn remove(&mut self, name: &str) -> bool {
        if self.nodes.remove(name).is_none() {
            return false;
        }

        for node in self.nodes.values_mut() {
            node.depends_on.remove(name);
        }
        self.prune_placeholders();
        true
    }

    /// Find cycles reachable from `start`, or in the whole graph when `None`.
    ///
    /// Never mutates the graph. An unknown `start` yields no cycles.
    pub fn find_cycles(&self, start: Option<&str>) -> Vec<Cycle> {
        cycles::find_cycles(self, start)
    }

    /// Cycles that pass through `name`
    pub fn cycles_through(&self, name: &str) -> Vec<Cycle> {
        self.find_cycles(Some(name))
            .into_iter()
            .filter(|cycle| cycle.iter().any(|n| n == name))
            .collect()
    }

    /// Total order with dependencies first, or `None` if any cycle exists
    pub fn topological_order(&self) -> Option<Vec<String>> {
        topology::topological_order(self)
    }

    /// Nodes that can be ordered before the first cycle blocks ordering
    pub fn acyclic_prefix(&self) -> Vec<String> {
        topology::kahn(self).0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Whether `name` is referenced but not defined
    pub fn is_placeholder(&self, name: &str) -> bool {
        self.nodes.get(name).is_some_and(|n| n.placeholder)
    }

    /// Direct dependencies of `name`
    pub fn dependencies(&self, name: &str) -> BTreeSet<String> {
        self.edges(name).clone()
    }

    /// Modules that depend directly on `name`
    pub fn dependents(&self, name: &str) -> BTreeSet<String> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.depends_on.contains(name))
            .map(|(other, _)| other.clone())
            .collect()
    }

    /// Direct dependencies and dependents of `name`
    pub fn neighbors(&self, name: &str) -> BTreeSet<String> {
        let mut all = self.dependencies(name);
        all.extend(self.dependents(name));
        all.remove(name);
        all
    }

    /// All node names, placeholders included, in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn edges(&self, name: &str) -> &BTreeSet<String> {
        self.nodes.get(name).map_or(&EMPTY, |n| &n.depends_on)
    }

    fn insert_node(&mut self, name: &str, depends_on: impl Iterator<Item = String>) {
        let depends_on: BTreeSet<String> = depends_on.collect();

        for dep in &depends_on {
            self.nodes.entry(dep.clone()).or_insert_with(|| Node {
                depends_on: BTreeSet::new(),
                placeholder: true,
            });
        }

        self.nodes.insert(
            name.to_string(),
            Node {
                depends_on,
                placeholder: false,
            },
        );
    }

    /// Drop placeholder nodes that nothing references any more
    fn prune_placeholders(&mut self) {
        let referenced: BTreeSet<String> = self
            .nodes
            .values()
            .flat_map(|n| n.depends_on.iter().cloned())
            .collect();

        self.nodes
            .retain(|name, node| !node.placeholder || referenced.contains(name));
    }
}
