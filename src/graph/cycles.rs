//! Cycle detection using an explicit-stack depth-first search
//!
//! The search keeps three pieces of state:
//!
//! 1. `visited`: nodes whose exploration has started (never re-entered)
//! 2. `on_stack`: nodes on the current DFS path
//! 3. `path`: the current DFS path in order
//!
//! A cycle is recorded when an edge points to a node already on the stack.
//! It is reported as the path slice from that node's position through the
//! current node, in traversal order.

use std::collections::HashSet;
use std::collections::btree_set;

use super::{Cycle, DependencyGraph};

struct CycleFinder<'a> {
    graph: &'a DependencyGraph,
    visited: HashSet<&'a str>,
    on_stack: HashSet<&'a str>,
    path: Vec<&'a str>,
    cycles: Vec<Cycle>,
}

pub(super) fn find_cycles(graph: &DependencyGraph, start: Option<&str>) -> Vec<Cycle> {
    let mut finder = CycleFinder {
        graph,
        visited: HashSet::new(),
        on_stack: HashSet::new(),
        path: Vec::new(),
        cycles: Vec::new(),
    };

    match start {
        Some(name) => {
            if let Some((root, _)) = graph.nodes.get_key_value(name) {
                finder.visit(root);
            }
        }
        None => {
            for root in graph.nodes.keys() {
                if !finder.visited.contains(root.as_str()) {
                    finder.visit(root);
                }
            }
        }
    }

    finder.cycles
}

impl<'a> CycleFinder<'a> {
    fn visit(&mut self, root: &'a str) {
        let mut stack: Vec<(&'a str, btree_set::Iter<'a, String>)> = Vec::new();
        self.enter(root);
        stack.push((root, self.graph.edges(root).iter()));

        while let Some((node, edges)) = stack.last_mut() {
            if let Some(next) = edges.next() {
                let next = next.as_str();
                if self.on_stack.contains(next) {
                    self.record_cycle(next);
                } else if !self.visited.contains(next) {
                    self.enter(next);
                    stack.push((next, self.graph.edges(next).iter()));
                }
            } else {
                let node = *node;
                self.on_stack.remove(node);
                self.path.pop();
                stack.pop();
            }
        }
    }

    fn enter(&mut self, node: &'a str) {
        self.visited.insert(node);
        self.on_stack.insert(node);
        self.path.push(node);
    }

    fn record_cycle(&mut self, back_to: &str) {
        if let Some(pos) = self.path.iter().position(|n| *n == back_to) {
            self.cycles
                .push(self.path[pos..].iter().map(ToString::to_string).collect());
        }
    }
}
