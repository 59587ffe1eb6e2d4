//! Structured validator report (`validator_report.json`)
//!
//! ```json
//! {
//!   "structure_scan": { "A": ["missing key_apis"] },
//!   "ai_review": {
//!     "overlapping_responsibilities": ["A vs B: ..."],
//!     "undefined_dependencies": ["A -> Ghost"],
//!     "missing_or_redundant_modules": { "missing": [], "redundant": [] },
//!     "suggestions": []
//!   },
//!   "boundary_analysis": { "merge_suggestions": [], "split_suggestions": [] }
//! }
//! ```
//!
//! Every counted issue lands in exactly one place: structural issues under
//! their first module in `structure_scan`, overlaps and undefined
//! dependencies in `ai_review`. The counts therefore equal the number of
//! distinct issues.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Validation;
use super::boundary::BoundaryAnalysis;
use crate::common::fs::{read_json, write_json};
use crate::domain::IssueKind;
use crate::error::{ArchfixError, Result};

pub const STRUCTURE_PREFIX: &str = "Structure issue: ";
pub const BOUNDARY_PREFIX: &str = "Boundary issue: ";
pub const SUGGESTION_PREFIX: &str = "Suggestion: ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingOrRedundant {
    #[serde(default)]
    pub missing: Vec<String>,
    #[serde(default)]
    pub redundant: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub overlapping_responsibilities: Vec<String>,
    #[serde(default)]
    pub undefined_dependencies: Vec<String>,
    #[serde(default)]
    pub missing_or_redundant_modules: MissingOrRedundant,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorReport {
    #[serde(default)]
    pub ai_review: Review,
    #[serde(default)]
    pub structure_scan: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub boundary_analysis: BoundaryAnalysis,
}

/// Issue count breakdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub structure_issues: usize,
    pub overlapping_responsibilities: usize,
    pub undefined_dependencies: usize,
    pub missing_modules: usize,
    pub redundant_modules: usize,
    pub total: usize,
}

impl ValidatorReport {
    pub fn from_validation(validation: &Validation) -> Self {
        let mut report = Self {
            boundary_analysis: validation.boundary.clone(),
            ..Self::default()
        };
        let mut undefined_targets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for issue in &validation.issues {
            let owner = issue.modules.first().cloned().unwrap_or_default();
            match issue.kind {
                IssueKind::ResponsibilityOverlap => {
                    report.ai_review.overlapping_responsibilities.push(format!(
                        "{}: {}",
                        issue.modules.join(" vs "),
                        issue.description
                    ));
                }
                IssueKind::UndefinedDependency => {
                    let target = issue
                        .description
                        .rsplit(": ")
                        .next()
                        .unwrap_or_default()
                        .to_string();
                    report
                        .ai_review
                        .undefined_dependencies
                        .push(format!("{owner} -> {target}"));
                    undefined_targets.entry(target).or_default().insert(owner);
                }
                _ => {
                    report
                        .structure_scan
                        .entry(owner)
                        .or_default()
                        .push(issue.description.clone());
                }
            }
        }

        for (target, referrers) in undefined_targets {
            let referrers: Vec<String> = referrers.into_iter().collect();
            report.ai_review.suggestions.push(format!(
                "Define module {target} or remove it from the dependencies of {}",
                referrers.join(", ")
            ));
        }

        report
    }

    pub fn counts(&self) -> IssueCounts {
        let structure_issues = self.structure_scan.values().map(Vec::len).sum();
        let overlapping_responsibilities = self.ai_review.overlapping_responsibilities.len();
        let undefined_dependencies = self.ai_review.undefined_dependencies.len();
        let missing_modules = self.ai_review.missing_or_redundant_modules.missing.len();
        let redundant_modules = self.ai_review.missing_or_redundant_modules.redundant.len();

        IssueCounts {
            structure_issues,
            overlapping_responsibilities,
            undefined_dependencies,
            missing_modules,
            redundant_modules,
            total: structure_issues
                + overlapping_responsibilities
                + undefined_dependencies
                + missing_modules
                + redundant_modules,
        }
    }

    /// Per-module issue texts, prefixed by their source
    pub fn issue_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (module, issues) in self.structure_scan.iter().filter(|(_, i)| !i.is_empty()) {
            map.entry(module.clone())
                .or_default()
                .extend(issues.iter().map(|i| format!("{STRUCTURE_PREFIX}{i}")));
        }

        for suggestion in &self.boundary_analysis.merge_suggestions {
            for module in &suggestion.modules {
                let others: Vec<&str> = suggestion
                    .modules
                    .iter()
                    .filter(|m| *m != module)
                    .map(String::as_str)
                    .collect();
                map.entry(module.clone()).or_default().push(format!(
                    "{BOUNDARY_PREFIX}Consider merging with {} - {}",
                    others.join(", "),
                    suggestion.reason
                ));
            }
        }

        for suggestion in &self.boundary_analysis.split_suggestions {
            if suggestion.module.is_empty() {
                continue;
            }
            map.entry(suggestion.module.clone()).or_default().push(format!(
                "{BOUNDARY_PREFIX}Consider splitting module - {}",
                suggestion.reason
            ));
        }

        for overlap in &self.ai_review.overlapping_responsibilities {
            let pair = overlap.split_once(": ").map_or(overlap.as_str(), |(p, _)| p);
            for module in pair.split(" vs ").map(str::trim).filter(|m| !m.is_empty()) {
                map.entry(module.to_string())
                    .or_default()
                    .push(format!("{SUGGESTION_PREFIX}{overlap}"));
            }
        }

        for dependency in &self.ai_review.undefined_dependencies {
            if let Some((module, _)) = dependency.split_once(" -> ") {
                map.entry(module.trim().to_string())
                    .or_default()
                    .push(format!("{SUGGESTION_PREFIX}undefined dependency {dependency}"));
            }
        }

        let known: Vec<String> = map.keys().cloned().collect();
        for suggestion in &self.ai_review.suggestions {
            for module in known.iter().filter(|m| mentions(suggestion, m)) {
                map.entry(module.clone())
                    .or_default()
                    .push(format!("{SUGGESTION_PREFIX}{suggestion}"));
            }
        }

        map
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ArchfixError::ReportNotFound {
                path: path.display().to_string(),
            });
        }
        read_json(path)
    }
}

/// Whether `text` names `module` as a whole word
fn mentions(text: &str, module: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
        .any(|word| word == module)
}
