//! Module boundary analysis
//!
//! Produces advisory merge and split suggestions. These are context for the
//! fix proposer and are never counted as issues.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::checks::format_cycle;
use crate::domain::{Module, name_stem};
use crate::graph::DependencyGraph;

/// Dependencies or dependents above this count suggest a split
pub const MAX_EDGES: usize = 5;
/// Responsibilities above this count suggest a split
pub const MAX_RESPONSIBILITIES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSuggestion {
    pub modules: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSuggestion {
    pub module: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryAnalysis {
    #[serde(default)]
    pub merge_suggestions: Vec<MergeSuggestion>,
    #[serde(default)]
    pub split_suggestions: Vec<SplitSuggestion>,
}

impl BoundaryAnalysis {
    pub fn analyze(modules: &BTreeMap<String, Module>, graph: &DependencyGraph) -> Self {
        let mut analysis = Self::default();
        analysis.merge_by_stem(modules);
        analysis.merge_cycles(graph);
        analysis.split_oversized(modules, graph);
        analysis
    }

    /// Modules sharing a name stem and at least one responsibility
    fn merge_by_stem(&mut self, modules: &BTreeMap<String, Module>) {
        let mut by_stem: BTreeMap<&str, Vec<&Module>> = BTreeMap::new();
        for module in modules.values() {
            by_stem.entry(name_stem(&module.name)).or_default().push(module);
        }

        for group in by_stem.values().filter(|g| g.len() > 1) {
            let mut owners: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
            for module in group {
                for responsibility in module.responsibilities.iter().filter(|r| !r.is_empty()) {
                    owners
                        .entry(responsibility.to_lowercase())
                        .or_default()
                        .insert(module.name.as_str());
                }
            }

            let shared: Vec<&str> = owners
                .iter()
                .filter(|(_, names)| names.len() > 1)
                .map(|(text, _)| text.as_str())
                .take(3)
                .collect();

            if !shared.is_empty() {
                self.merge_suggestions.push(MergeSuggestion {
                    modules: group.iter().map(|m| m.name.clone()).collect(),
                    reason: format!(
                        "similar names with overlapping responsibilities: {}",
                        shared.join(", ")
                    ),
                });
            }
        }
    }

    fn merge_cycles(&mut self, graph: &DependencyGraph) {
        for cycle in graph.find_cycles(None).into_iter().filter(|c| c.len() > 1) {
            self.merge_suggestions.push(MergeSuggestion {
                reason: format!("circular dependency: {}", format_cycle(&cycle)),
                modules: cycle,
            });
        }
    }

    fn split_oversized(&mut self, modules: &BTreeMap<String, Module>, graph: &DependencyGraph) {
        for module in modules.values() {
            let name = &module.name;

            let deps = graph.dependencies(name).len();
            if deps > MAX_EDGES {
                self.split(name, format!("too many dependencies ({deps})"));
            }

            let dependents = graph.dependents(name).len();
            if dependents > MAX_EDGES {
                self.split(name, format!("depended on by too many modules ({dependents})"));
            }

            let responsibilities = module.responsibilities.len();
            if responsibilities > MAX_RESPONSIBILITIES {
                self.split(
                    name,
                    format!("too many responsibilities ({responsibilities})"),
                );
            }
        }
    }

    fn split(&mut self, module: &str, reason: String) {
        self.split_suggestions.push(SplitSuggestion {
            module: module.to_string(),
            reason,
        });
    }

    /// Boundary notes for one module, as shown to the fix proposer
    pub fn notes_for(&self, module: &str) -> Vec<String> {
        let merges = self
            .merge_suggestions
            .iter()
            .filter(|s| s.modules.iter().any(|m| m == module))
            .map(|s| {
                let others: Vec<&str> = s
                    .modules
                    .iter()
                    .filter(|m| *m != module)
                    .map(String::as_str)
                    .collect();
                format!("Consider merging with {} - {}", others.join(", "), s.reason)
            });

        let splits = self
            .split_suggestions
            .iter()
            .filter(|s| s.module == module)
            .map(|s| format!("Consider splitting module - {}", s.reason));

        merges.chain(splits).collect()
    }

    /// Keep only suggestions touching `scope`
    pub fn retain_scope(&mut self, scope: &BTreeSet<String>) {
        self.merge_suggestions
            .retain(|s| s.modules.iter().any(|m| scope.contains(m)));
        self.split_suggestions.retain(|s| scope.contains(&s.module));
    }
}
