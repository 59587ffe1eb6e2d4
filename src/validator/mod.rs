//! Validation of the module set
//!
//! The global pass runs, in order:
//!
//! 1. parse failures for records that could not be loaded
//! 2. per-module checks: completeness, undefined dependencies, layering,
//!    responsibility overlap
//! 3. dependency cycles over the whole graph
//! 4. near-duplicate responsibilities
//! 5. naming-convention consistency
//!
//! Issues reported by more than one check are kept once. Scoped validation
//! runs the same pass and keeps the issues that involve the scope, so scoped
//! counts are always consistent with global ones.

pub mod boundary;
pub mod checks;
pub mod naming;
pub mod report;
pub mod similarity;

use std::collections::{BTreeSet, HashSet};

use crate::config::ValidationConfig;
use crate::domain::Issue;
use crate::graph::DependencyGraph;
use crate::index::ArchitectureIndex;
use crate::store::LoadedModules;

pub use boundary::BoundaryAnalysis;
pub use report::{IssueCounts, ValidatorReport};

/// Result of a validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub issues: Vec<Issue>,
    /// Advisory, not counted
    pub boundary: BoundaryAnalysis,
}

impl Validation {
    pub fn total(&self) -> usize {
        self.issues.len()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues that name `module`
    pub fn issues_for<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues.iter().filter(move |i| i.involves(module))
    }

    /// Modules named by at least one issue, in first-seen order
    pub fn affected_modules(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.issues
            .iter()
            .flat_map(|i| i.modules.iter())
            .filter(|m| seen.insert(m.as_str()))
            .cloned()
            .collect()
    }

    pub fn report(&self) -> ValidatorReport {
        ValidatorReport::from_validation(self)
    }
}

/// Runs the structural checks
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Global pass over every module
    pub fn validate(&self, loaded: &LoadedModules, graph: &DependencyGraph) -> Validation {
        let modules = &loaded.modules;
        let index = ArchitectureIndex::build(modules.values());
        let mut issues = Vec::new();

        for (name, reason) in &loaded.failures {
            issues.push(checks::parse_failure(name, reason));
        }

        let is_defined =
            |name: &str| modules.contains_key(name) || loaded.failures.contains_key(name);

        for module in modules.values() {
            if self.config.check_completeness {
                issues.extend(checks::check_completeness(module));
            }
            issues.extend(checks::check_undefined_dependencies(module, is_defined));
            if self.config.report_missing_layer {
                issues.extend(checks::check_missing_layer(module));
            }
            issues.extend(checks::check_layer_violation(module, modules));
            issues.extend(checks::check_responsibility_overlap(module, &index, modules));
        }

        issues.extend(graph.find_cycles(None).iter().map(checks::cycle_issue));
        issues.extend(similarity::check_similarity(
            modules,
            self.config.similarity_threshold,
        ));

        let names: Vec<&str> = modules.keys().map(String::as_str).collect();
        issues.extend(naming::check_naming(&names, self.config.naming_majority));

        Validation {
            issues: dedupe(issues),
            boundary: BoundaryAnalysis::analyze(modules, graph),
        }
    }

    /// Same checks, keeping only issues and notes that involve `scope`
    pub fn validate_scoped(
        &self,
        loaded: &LoadedModules,
        graph: &DependencyGraph,
        scope: &BTreeSet<String>,
    ) -> Validation {
        let mut validation = self.validate(loaded, graph);
        validation
            .issues
            .retain(|issue| issue.modules.iter().any(|m| scope.contains(m)));
        validation.boundary.retain_scope(scope);
        validation
    }
}

fn dedupe(issues: Vec<Issue>) -> Vec<Issue> {
    let mut seen = HashSet::new();
    issues
        .into_iter()
        .filter(|issue| seen.insert(issue.key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IssueKind, Module};
    use std::collections::BTreeMap;

    fn complete(name: &str) -> Module {
        let mut module = Module::new(name).with_responsibilities([format!("{name} duties")]);
        module.key_apis = vec![format!("{}_api", name.to_lowercase())];
        module.data_inputs = vec!["Request".to_string()];
        module.data_outputs = vec!["Response".to_string()];
        module.target_path = format!("src/{}.rs", name.to_lowercase());
        module
    }

    fn loaded(list: Vec<Module>) -> LoadedModules {
        LoadedModules {
            modules: list.into_iter().map(|m| (m.name.clone(), m)).collect(),
            failures: BTreeMap::new(),
        }
    }

    fn run(loaded: &LoadedModules) -> Validation {
        let graph = DependencyGraph::from_modules(loaded.modules.values());
        Validator::default().validate(loaded, &graph)
    }

    #[test]
    fn test_clean_chain() {
        let set = loaded(vec![
            complete("A").with_depends_on(["B"]),
            complete("B").with_depends_on(["C"]),
            complete("C"),
        ]);
        let validation = run(&set);
        assert!(validation.is_clean(), "{:?}", validation.issues);
    }

    #[test]
    fn test_undefined_reported_once() {
        let set = loaded(vec![complete("A").with_depends_on(["Ghost", "Phantom"])]);
        let validation = run(&set);

        let undefined: Vec<&Issue> = validation
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::UndefinedDependency)
            .collect();
        assert_eq!(undefined.len(), 2);
    }

    #[test]
    fn test_overlap_counted_once() {
        let set = loaded(vec![
            complete("A").with_responsibilities(["Send email"]),
            complete("B").with_responsibilities(["Send email"]),
        ]);
        let validation = run(&set);

        assert_eq!(
            validation
                .issues
                .iter()
                .filter(|i| i.kind == IssueKind::ResponsibilityOverlap)
                .count(),
            1
        );
    }

    #[test]
    fn test_parse_failures_reported() {
        let mut set = loaded(vec![complete("A")]);
        set.failures
            .insert("Broken".to_string(), "expected value".to_string());

        let validation = run(&set);
        assert_eq!(validation.total(), 1);
        assert_eq!(validation.issues[0].kind, IssueKind::ParseFailure);
    }

    #[test]
    fn test_dependency_on_unparseable_module_not_undefined() {
        let mut set = loaded(vec![complete("A").with_depends_on(["Broken"])]);
        set.failures
            .insert("Broken".to_string(), "bad".to_string());

        let validation = run(&set);
        assert!(validation
            .issues
            .iter()
            .all(|i| i.kind != IssueKind::UndefinedDependency));
    }

    #[test]
    fn test_completeness_can_be_disabled() {
        let set = loaded(vec![Module::new("Bare")]);
        assert!(!run(&set).is_clean());

        let graph = DependencyGraph::from_modules(set.modules.values());
        let validator = Validator::new(ValidationConfig {
            check_completeness: false,
            ..ValidationConfig::default()
        });
        assert!(validator.validate(&set, &graph).is_clean());
    }

    #[test]
    fn test_missing_layer_optional() {
        let set = loaded(vec![complete("A")]);
        let graph = DependencyGraph::from_modules(set.modules.values());
        let validator = Validator::new(ValidationConfig {
            report_missing_layer: true,
            ..ValidationConfig::default()
        });

        let validation = validator.validate(&set, &graph);
        assert_eq!(validation.total(), 1);
        assert_eq!(validation.issues[0].description, "missing layer/pattern");
    }

    #[test]
    fn test_scoped_validation() {
        let set = loaded(vec![
            complete("A").with_depends_on(["Ghost"]),
            complete("B").with_depends_on(["Phantom"]),
        ]);
        let graph = DependencyGraph::from_modules(set.modules.values());
        let scope = BTreeSet::from(["A".to_string()]);

        let scoped = Validator::default().validate_scoped(&set, &graph, &scope);
        assert_eq!(scoped.total(), 1);
        assert!(scoped.issues[0].involves("A"));
    }

    #[test]
    fn test_cycle_detected_globally() {
        let set = loaded(vec![
            complete("A").with_depends_on(["D"]),
            complete("D").with_depends_on(["A"]),
        ]);
        let validation = run(&set);

        let cycles: Vec<&Issue> = validation
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::CircularDependency)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].description, "Circular dependency: A -> D -> A");
        assert_eq!(validation.affected_modules(), vec!["A", "D"]);
    }
}
