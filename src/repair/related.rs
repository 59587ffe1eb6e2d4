//! Proposer context: prioritized issues and related modules

use std::collections::BTreeMap;

use crate::domain::{Issue, Module, name_stem};
use crate::graph::DependencyGraph;
use crate::proposer::{FixRequest, RelatedModule, Relationship};
use crate::validator::Validation;
use crate::validator::report::BOUNDARY_PREFIX;

/// Responsibilities and key APIs kept per related module
const RELATED_DETAIL: usize = 3;

/// Below this many graph neighbors, name-stem matches are added
const MIN_NEIGHBORS: usize = 3;

/// Tier of boundary notes, between undefined dependencies and the rest
const BOUNDARY_TIER: u8 = 2;

/// Pick at most `limit` issue texts, most urgent first.
///
/// Order: parse and structural problems, undefined dependencies, boundary
/// notes, everything else. Ties keep their original order.
pub fn prioritize_issues(
    issues: &[&Issue],
    boundary_notes: &[String],
    limit: usize,
) -> Vec<String> {
    let mut tiered: Vec<(u8, String)> = issues
        .iter()
        .map(|issue| (issue.kind.priority(), issue.description.clone()))
        .chain(
            boundary_notes
                .iter()
                .map(|note| (BOUNDARY_TIER, format!("{BOUNDARY_PREFIX}{note}"))),
        )
        .collect();

    tiered.sort_by_key(|(tier, _)| *tier);
    tiered.into_iter().take(limit).map(|(_, text)| text).collect()
}

/// Graph neighbors of `name`, topped up with name-stem matches, at most `limit`
pub fn related_modules(
    name: &str,
    modules: &BTreeMap<String, Module>,
    graph: &DependencyGraph,
    limit: usize,
) -> Vec<RelatedModule> {
    let mut related: Vec<RelatedModule> = Vec::new();

    let push = |other: &str, relationship: Relationship, related: &mut Vec<RelatedModule>| {
        if related.iter().any(|r| r.name == other) {
            return;
        }
        if let Some(module) = modules.get(other) {
            related.push(summarize(module, relationship));
        }
    };

    for dep in graph.dependencies(name) {
        push(&dep, Relationship::Dependency, &mut related);
    }
    for dependent in graph.dependents(name) {
        push(&dependent, Relationship::Dependent, &mut related);
    }

    if related.len() < MIN_NEIGHBORS {
        let stem = name_stem(name);
        for other in modules.keys() {
            if other != name && name_stem(other) == stem {
                push(other, Relationship::SimilarName, &mut related);
            }
        }
    }

    related.truncate(limit);
    related
}

fn summarize(module: &Module, relationship: Relationship) -> RelatedModule {
    RelatedModule {
        name: module.name.clone(),
        relationship,
        responsibilities: module
            .responsibilities
            .iter()
            .take(RELATED_DETAIL)
            .cloned()
            .collect(),
        key_apis: module.key_apis.iter().take(RELATED_DETAIL).cloned().collect(),
    }
}

/// Assemble the request for one module from batch-start state
pub fn build_request(
    current: &Module,
    validation: &Validation,
    modules: &BTreeMap<String, Module>,
    graph: &DependencyGraph,
    max_issues: usize,
    max_related: usize,
) -> FixRequest {
    let name = current.name.as_str();
    let issues: Vec<&Issue> = validation.issues_for(name).collect();
    let notes = validation.boundary.notes_for(name);

    FixRequest {
        module_name: name.to_string(),
        issues: prioritize_issues(&issues, &notes, max_issues),
        current: current.clone(),
        related: related_modules(name, modules, graph, max_related),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IssueKind;

    fn set(list: Vec<Module>) -> BTreeMap<String, Module> {
        list.into_iter().map(|m| (m.name.clone(), m)).collect()
    }

    #[test]
    fn test_prioritize_issues() {
        let naming = Issue::new(IssueKind::NamingInconsistency, ["A"], "naming");
        let undefined =
            Issue::new(IssueKind::UndefinedDependency, ["A"], "undefined dependency: X");
        let parse = Issue::new(IssueKind::ParseFailure, ["A"], "failed to parse: eof");
        let notes = vec!["Consider splitting module - too many dependencies (6)".to_string()];

        let picked = prioritize_issues(&[&naming, &undefined, &parse], &notes, 3);
        assert_eq!(
            picked,
            vec![
                "failed to parse: eof".to_string(),
                "undefined dependency: X".to_string(),
                format!("{BOUNDARY_PREFIX}{}", notes[0]),
            ]
        );
    }

    #[test]
    fn test_prioritize_respects_limit() {
        let issues: Vec<Issue> = (0..5)
            .map(|i| {
                Issue::new(
                    IssueKind::UndefinedDependency,
                    ["A"],
                    format!("undefined dependency: {i}"),
                )
            })
            .collect();
        let refs: Vec<&Issue> = issues.iter().collect();

        let picked = prioritize_issues(&refs, &[], 3);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0], "undefined dependency: 0");
    }

    #[test]
    fn test_related_neighbors_first() {
        let modules = set(vec![
            Module::new("UserService").with_depends_on(["UserRepository"]),
            Module::new("UserRepository").with_responsibilities(["a", "b", "c", "d"]),
            Module::new("UserController").with_depends_on(["UserService"]),
            Module::new("UserPage"),
        ]);
        let graph = DependencyGraph::from_modules(modules.values());

        let related = related_modules("UserService", &modules, &graph, 5);
        let names: Vec<&str> = related.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["UserRepository", "UserController", "UserPage"]);

        assert_eq!(related[0].relationship, Relationship::Dependency);
        assert_eq!(related[0].responsibilities.len(), 3);
        assert_eq!(related[1].relationship, Relationship::Dependent);
        assert_eq!(related[2].relationship, Relationship::SimilarName);
    }

    #[test]
    fn test_related_skips_placeholders_and_limits() {
        let modules = set(vec![
            Module::new("A").with_depends_on(["Ghost", "B", "C"]),
            Module::new("B"),
            Module::new("C"),
        ]);
        let graph = DependencyGraph::from_modules(modules.values());

        let related = related_modules("A", &modules, &graph, 1);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].name, "B");
    }
}
