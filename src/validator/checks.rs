//! Per-module structural checks
//!
//! Every check is a pure function of the module set, the index and the graph.

use std::collections::BTreeMap;

use crate::domain::{Issue, IssueKind, Module};
use crate::graph::{Cycle, DependencyGraph};
use crate::index::{ArchitectureIndex, patterns};

/// Render a cycle as `A -> B -> A`
pub fn format_cycle(cycle: &[String]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(String::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first);
    }
    parts.join(" -> ")
}

pub fn cycle_issue(cycle: &Cycle) -> Issue {
    Issue::new(
        IssueKind::CircularDependency,
        cycle.iter().map(String::as_str),
        format!("Circular dependency: {}", format_cycle(cycle)),
    )
}

/// Dependencies naming modules that do not exist, one issue per missing target
pub fn check_undefined_dependencies<F>(module: &Module, is_defined: F) -> Vec<Issue>
where
    F: Fn(&str) -> bool,
{
    module
        .depends_on
        .iter()
        .filter(|dep| dep.as_str() != module.name && !is_defined(dep))
        .map(|dep| {
            Issue::new(
                IssueKind::UndefinedDependency,
                [module.name.as_str()],
                format!("undefined dependency: {dep}"),
            )
        })
        .collect()
}

/// Dependencies that cross the layering rules of the module's pattern.
///
/// Skipped when the module has no placement or its placement is not in the
/// pattern table. Dependencies without a placement are skipped.
pub fn check_layer_violation(module: &Module, modules: &BTreeMap<String, Module>) -> Vec<Issue> {
    let Some(placement) = module.placement() else {
        return Vec::new();
    };

    module
        .depends_on
        .iter()
        .filter_map(|dep| modules.get(dep))
        .filter_map(|dep| {
            let dep_placement = dep.placement()?;
            match patterns::dependency_allowed(placement, dep_placement) {
                Some(false) => Some(Issue::new(
                    IssueKind::LayerViolation,
                    [module.name.as_str(), dep.name.as_str()],
                    format!(
                        "{} ({}.{}) must not depend on {} ({}.{})",
                        module.name,
                        placement.0,
                        placement.1,
                        dep.name,
                        dep_placement.0,
                        dep_placement.1
                    ),
                )),
                _ => None,
            }
        })
        .collect()
}

/// Metadata gap: the module declares no pattern/layer
pub fn check_missing_layer(module: &Module) -> Option<Issue> {
    module.placement().is_none().then(|| {
        Issue::new(
            IssueKind::IncompleteRecord,
            [module.name.as_str()],
            "missing layer/pattern",
        )
    })
}

/// Responsibilities claimed verbatim by another module
pub fn check_responsibility_overlap(
    module: &Module,
    index: &ArchitectureIndex,
    modules: &BTreeMap<String, Module>,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    for responsibility in &module.responsibilities {
        let Some(owners) = index.modules_with_responsibility(responsibility) else {
            continue;
        };

        for other in owners.iter().filter(|o| **o != module.name) {
            let (first, second) = if module.name < *other {
                (module.name.as_str(), other.as_str())
            } else {
                (other.as_str(), module.name.as_str())
            };

            let description = match layer_clash(modules.get(first), modules.get(second)) {
                Some((pattern, a, b)) => format!(
                    "Responsibility '{responsibility}' is claimed by layers {a} and {b} of {pattern} ({first}, {second})"
                ),
                None => format!("Responsibility '{responsibility}' is claimed by both {first} and {second}"),
            };

            issues.push(Issue::new(
                IssueKind::ResponsibilityOverlap,
                [first, second],
                description,
            ));
        }
    }

    issues
}

/// Same pattern, different layers
fn layer_clash<'a>(
    first: Option<&'a Module>,
    second: Option<&'a Module>,
) -> Option<(&'a str, &'a str, &'a str)> {
    let (p1, l1) = first?.placement()?;
    let (p2, l2) = second?.placement()?;
    (p1 == p2 && l1 != l2).then_some((p1, l1, l2))
}

/// Simulate giving `candidate` the dependencies `deps` and report the cycles
/// through it. The graph itself is not modified.
pub fn check_circular_dependency<I, S>(
    graph: &DependencyGraph,
    candidate: &str,
    deps: I,
) -> Vec<Issue>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut simulated = graph.clone();
    simulated.add_or_update(candidate, deps);

    simulated
        .cycles_through(candidate)
        .iter()
        .map(cycle_issue)
        .collect()
}

/// Empty required fields, one issue per field
pub fn check_completeness(module: &Module) -> Vec<Issue> {
    module
        .missing_fields()
        .into_iter()
        .map(|field| {
            Issue::new(
                IssueKind::IncompleteRecord,
                [module.name.as_str()],
                format!("missing {field}"),
            )
        })
        .collect()
}

/// A record that exists on disk but could not be loaded
pub fn parse_failure(name: &str, reason: &str) -> Issue {
    Issue::new(
        IssueKind::ParseFailure,
        [name],
        format!("failed to parse: {reason}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules(list: Vec<Module>) -> BTreeMap<String, Module> {
        list.into_iter().map(|m| (m.name.clone(), m)).collect()
    }

    #[test]
    fn test_format_cycle() {
        let cycle = vec!["A".to_string(), "D".to_string()];
        assert_eq!(format_cycle(&cycle), "A -> D -> A");
    }

    #[test]
    fn test_undefined_reported_once_per_target() {
        let module = Module::new("A").with_depends_on(["X", "Y", "B", "A"]);
        let issues = check_undefined_dependencies(&module, |name| name == "B");

        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::UndefinedDependency));
        assert!(issues[0].description.ends_with('X'));
        assert!(issues[1].description.ends_with('Y'));
    }

    #[test]
    fn test_layer_violation() {
        let set = modules(vec![
            Module::new("UserController")
                .with_layer("backend", "controllers")
                .with_depends_on(["UserRepository", "UserService", "Loose"]),
            Module::new("UserService").with_layer("backend", "services"),
            Module::new("UserRepository").with_layer("backend", "repositories"),
            Module::new("Loose"),
        ]);

        let issues = check_layer_violation(&set["UserController"], &set);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::LayerViolation);
        assert_eq!(issues[0].modules, vec!["UserController", "UserRepository"]);
    }

    #[test]
    fn test_layer_check_skips_unplaced_modules() {
        let set = modules(vec![
            Module::new("Free").with_depends_on(["Model"]),
            Module::new("Model").with_layer("backend", "models"),
            Module::new("Odd")
                .with_layer("mobile", "screens")
                .with_depends_on(["Model"]),
        ]);

        assert!(check_layer_violation(&set["Free"], &set).is_empty());
        assert!(check_layer_violation(&set["Odd"], &set).is_empty());
        assert!(check_missing_layer(&set["Free"]).is_some());
        assert!(check_missing_layer(&set["Model"]).is_none());
    }

    #[test]
    fn test_responsibility_overlap() {
        let set = modules(vec![
            Module::new("A").with_responsibilities(["Send email"]),
            Module::new("B").with_responsibilities(["Send email", "Other"]),
        ]);
        let index = ArchitectureIndex::build(set.values());

        let from_a = check_responsibility_overlap(&set["A"], &index, &set);
        let from_b = check_responsibility_overlap(&set["B"], &index, &set);
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a, from_b);
        assert_eq!(from_a[0].modules, vec!["A", "B"]);
    }

    #[test]
    fn test_responsibility_overlap_across_layers() {
        let set = modules(vec![
            Module::new("OrderController")
                .with_layer("backend", "controllers")
                .with_responsibilities(["Validate orders"]),
            Module::new("OrderService")
                .with_layer("backend", "services")
                .with_responsibilities(["Validate orders"]),
        ]);
        let index = ArchitectureIndex::build(set.values());

        let issues = check_responsibility_overlap(&set["OrderService"], &index, &set);
        assert!(issues[0].description.contains("layers controllers and services of backend"));
    }

    #[test]
    fn test_check_circular_dependency_simulates() {
        let mut graph = DependencyGraph::new();
        graph.add_or_update("A", ["B"]);
        graph.add_or_update("B", Vec::<String>::new());

        let issues = check_circular_dependency(&graph, "B", ["A"]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CircularDependency);
        assert!(graph.dependencies("B").is_empty());

        assert!(check_circular_dependency(&graph, "B", Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_completeness() {
        let mut module = Module::new("A").with_responsibilities(["x"]);
        module.key_apis = vec!["run".to_string()];
        module.data_inputs = vec!["in".to_string()];

        let issues = check_completeness(&module);
        let texts: Vec<&str> = issues.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(texts, vec!["missing data_outputs", "missing target_path"]);
    }
}
