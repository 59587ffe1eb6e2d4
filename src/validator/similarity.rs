//! Near-duplicate responsibility detection
//!
//! Two responsibilities are near duplicates when the share of words they
//! have in common, `|A ∩ B| / max(|A|, |B|)`, exceeds the threshold. Words
//! are lowercased alphanumeric runs. Exact matches are left to the overlap
//! check.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Issue, IssueKind, Module};

/// Lowercase word set of a responsibility
pub fn words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Word-overlap ratio between two texts, in `[0, 1]`
pub fn word_overlap(a: &str, b: &str) -> f64 {
    let a = words(a);
    let b = words(b);
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }

    let shared = a.intersection(&b).count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = shared as f64 / longest as f64;
    ratio
}

/// Near-duplicate responsibilities owned by different modules
pub fn check_similarity(modules: &BTreeMap<String, Module>, threshold: f64) -> Vec<Issue> {
    let mut issues = Vec::new();
    let entries: Vec<&Module> = modules.values().collect();

    for (i, left) in entries.iter().enumerate() {
        for right in &entries[i + 1..] {
            for a in &left.responsibilities {
                for b in &right.responsibilities {
                    if a == b {
                        continue;
                    }
                    if word_overlap(a, b) > threshold {
                        issues.push(Issue::new(
                            IssueKind::ResponsibilityOverlap,
                            [left.name.as_str(), right.name.as_str()],
                            format!(
                                "Near-duplicate responsibilities '{a}' ({}) and '{b}' ({})",
                                left.name, right.name
                            ),
                        ));
                    }
                }
            }
        }
    }

    issues
}
