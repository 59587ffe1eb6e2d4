//! Structural issues found by the validator
//!
//! Issues are values produced by a validation pass. They are never stored on
//! a module record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a structural defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    CircularDependency,
    UndefinedDependency,
    LayerViolation,
    ResponsibilityOverlap,
    NamingInconsistency,
    ParseFailure,
    IncompleteRecord,
}

impl IssueKind {
    /// Ordering tier used when choosing which issues to send to the proposer.
    ///
    /// Lower is more urgent. Boundary notes are tier 2 and are not issues.
    pub fn priority(self) -> u8 {
        match self {
            IssueKind::ParseFailure
            | IssueKind::CircularDependency
            | IssueKind::LayerViolation
            | IssueKind::IncompleteRecord => 0,
            IssueKind::UndefinedDependency => 1,
            IssueKind::ResponsibilityOverlap | IssueKind::NamingInconsistency => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::CircularDependency => "circular_dependency",
            IssueKind::UndefinedDependency => "undefined_dependency",
            IssueKind::LayerViolation => "layer_violation",
            IssueKind::ResponsibilityOverlap => "responsibility_overlap",
            IssueKind::NamingInconsistency => "naming_inconsistency",
            IssueKind::ParseFailure => "parse_failure",
            IssueKind::IncompleteRecord => "incomplete_record",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural defect involving one or more modules
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// Modules involved, in the order the check reported them
    pub modules: Vec<String>,
    pub description: String,
}

impl Issue {
    pub fn new<I, S>(kind: IssueKind, modules: I, description: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            modules: modules.into_iter().map(Into::into).collect(),
            description: description.into(),
        }
    }

    /// Whether the issue names `module`
    pub fn involves(&self, module: &str) -> bool {
        self.modules.iter().any(|m| m == module)
    }

    /// Identity used to deduplicate issues reported by several checks
    pub fn key(&self) -> (IssueKind, Vec<String>, String) {
        let mut modules = self.modules.clone();
        modules.sort();
        modules.dedup();
        (self.kind, modules, self.description.clone())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&IssueKind::UndefinedDependency).unwrap();
        assert_eq!(json, "\"undefined_dependency\"");
    }

    #[test]
    fn test_priority_tiers() {
        assert!(IssueKind::ParseFailure.priority() < IssueKind::UndefinedDependency.priority());
        assert!(
            IssueKind::UndefinedDependency.priority()
                < IssueKind::ResponsibilityOverlap.priority()
        );
        assert_eq!(
            IssueKind::CircularDependency.priority(),
            IssueKind::LayerViolation.priority()
        );
    }

    #[test]
    fn test_key_ignores_module_order() {
        let a = Issue::new(IssueKind::ResponsibilityOverlap, ["A", "B"], "shared");
        let b = Issue::new(IssueKind::ResponsibilityOverlap, ["B", "A"], "shared");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_display() {
        let issue = Issue::new(IssueKind::CircularDependency, ["A"], "A -> B -> A");
        assert_eq!(issue.to_string(), "[circular_dependency] A -> B -> A");
        assert!(issue.involves("A"));
        assert!(!issue.involves("B"));
    }
}
