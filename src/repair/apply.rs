//! Merging a proposal into the module set

use std::collections::BTreeSet;

use crate::domain::Module;
use crate::graph::DependencyGraph;
use crate::validator::checks::check_circular_dependency;

/// A proposal ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedFix {
    pub module: Module,
    /// Dependencies removed because they closed a cycle through the module
    pub stripped: Vec<String>,
}

/// Normalize `proposed` against `original` and break cycles it would create.
///
/// The name is forced to `original.name`, and optional fields the proposal
/// left out are kept from the original. If the new dependencies put the
/// module on a cycle, every dependency of the module lying on such a cycle is
/// dropped; this repeats until no cycle passes through the module. `graph`
/// is left untouched.
pub fn merge_proposal(
    original: &Module,
    mut proposed: Module,
    graph: &DependencyGraph,
) -> AppliedFix {
    let name = original.name.clone();
    proposed.name.clone_from(&name);
    proposed.inherit_optional(original);

    let mut stripped = BTreeSet::new();

    loop {
        let cycles = check_circular_dependency(graph, &name, proposed.depends_on.iter().cloned());
        let on_cycle: BTreeSet<String> = cycles
            .iter()
            .flat_map(|issue| &issue.modules)
            .filter(|dep| proposed.depends_on.contains(*dep))
            .cloned()
            .collect();

        if on_cycle.is_empty() {
            break;
        }

        tracing::debug!(
            module = %name,
            removed = ?on_cycle,
            "stripping dependencies that close a cycle"
        );
        for dep in &on_cycle {
            proposed.depends_on.remove(dep);
        }
        stripped.extend(on_cycle);
    }

    AppliedFix {
        module: proposed,
        stripped: stripped.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(modules: &[Module]) -> DependencyGraph {
        DependencyGraph::from_modules(modules)
    }

    #[test]
    fn test_name_forced_and_optional_fields_kept() {
        let original = Module::new("A").with_layer("backend", "service");
        let mut proposed = Module::new("Renamed");
        proposed.target_path = String::new();

        let applied = merge_proposal(&original, proposed, &graph(&[original.clone()]));
        assert_eq!(applied.module.name, "A");
        assert_eq!(applied.module.placement(), Some(("backend", "service")));
        assert!(applied.stripped.is_empty());
    }

    #[test]
    fn test_strips_cycle_closing_dependency() {
        let modules = vec![
            Module::new("A").with_depends_on(["B"]),
            Module::new("B").with_depends_on(["C"]),
            Module::new("C"),
            Module::new("D"),
        ];
        let live = graph(&modules);

        let proposed = Module::new("C").with_depends_on(["A", "D"]);
        let applied = merge_proposal(&modules[2], proposed, &live);

        assert_eq!(applied.stripped, vec!["A"]);
        assert_eq!(applied.module.depends_on, BTreeSet::from(["D".to_string()]));
        assert!(check_circular_dependency(&live, "C", applied.module.depends_on.iter().cloned())
            .is_empty());
        // Live graph not mutated
        assert!(live.dependencies("C").is_empty());
    }

    #[test]
    fn test_strips_self_dependency() {
        let original = Module::new("A");
        let proposed = Module::new("A").with_depends_on(["A", "B"]);

        let applied = merge_proposal(&original, proposed, &graph(&[original.clone()]));
        assert_eq!(applied.stripped, vec!["A"]);
        assert!(applied.module.depends_on.contains("B"));
    }

    #[test]
    fn test_existing_cycle_broken() {
        let modules = vec![
            Module::new("A").with_depends_on(["D"]),
            Module::new("D").with_depends_on(["A"]),
        ];
        let proposed = Module::new("A").with_depends_on(["D"]);

        let applied = merge_proposal(&modules[0], proposed, &graph(&modules));
        assert!(applied.module.depends_on.is_empty());
        assert_eq!(applied.stripped, vec!["D"]);
    }
}
