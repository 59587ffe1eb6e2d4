//! Naming-convention consistency
//!
//! Each module name is matched against a fixed set of case styles. The style
//! that matches the most names is the convention if it covers at least the
//! configured share of all names; names that do not match it are flagged.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{Issue, IssueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStyle {
    Pascal,
    Camel,
    Snake,
    Kebab,
    ScreamingSnake,
}

impl CaseStyle {
    const ALL: [CaseStyle; 5] = [
        CaseStyle::Pascal,
        CaseStyle::Camel,
        CaseStyle::Snake,
        CaseStyle::Kebab,
        CaseStyle::ScreamingSnake,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CaseStyle::Pascal => "PascalCase",
            CaseStyle::Camel => "camelCase",
            CaseStyle::Snake => "snake_case",
            CaseStyle::Kebab => "kebab-case",
            CaseStyle::ScreamingSnake => "SCREAMING_SNAKE_CASE",
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            CaseStyle::Pascal => &PASCAL,
            CaseStyle::Camel => &CAMEL,
            CaseStyle::Snake => &SNAKE,
            CaseStyle::Kebab => &KEBAB,
            CaseStyle::ScreamingSnake => &SCREAMING,
        }
    }

    pub fn matches(self, name: &str) -> bool {
        self.regex().is_match(name)
    }
}

static PASCAL: LazyLock<Regex> = LazyLock::new(|| style_regex(r"^[A-Z][a-z0-9]*(?:[A-Z][a-z0-9]*)*$"));
static CAMEL: LazyLock<Regex> = LazyLock::new(|| style_regex(r"^[a-z][a-z0-9]*(?:[A-Z][a-z0-9]*)*$"));
static SNAKE: LazyLock<Regex> = LazyLock::new(|| style_regex(r"^[a-z][a-z0-9]*(?:_[a-z0-9]+)*$"));
static KEBAB: LazyLock<Regex> = LazyLock::new(|| style_regex(r"^[a-z][a-z0-9]*(?:-[a-z0-9]+)*$"));
static SCREAMING: LazyLock<Regex> =
    LazyLock::new(|| style_regex(r"^[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)*$"));

#[allow(clippy::expect_used)]
fn style_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("case style patterns are valid")
}

/// The style covering at least `majority` of `names`, if any
pub fn dominant_style(names: &[&str], majority: f64) -> Option<CaseStyle> {
    if names.is_empty() {
        return None;
    }

    let (style, count) = CaseStyle::ALL
        .iter()
        .map(|style| (*style, names.iter().filter(|n| style.matches(n)).count()))
        .max_by_key(|(_, count)| *count)?;

    #[allow(clippy::cast_precision_loss)]
    let share = count as f64 / names.len() as f64;
    (count > 0 && share >= majority).then_some(style)
}

/// Flag names that do not follow the dominant style
pub fn check_naming(names: &[&str], majority: f64) -> Vec<Issue> {
    let Some(style) = dominant_style(names, majority) else {
        return Vec::new();
    };

    names
        .iter()
        .filter(|name| !style.matches(name))
        .map(|name| {
            Issue::new(
                IssueKind::NamingInconsistency,
                [*name],
                format!(
                    "Module name '{name}' does not follow the {} convention used by most modules",
                    style.label()
                ),
            )
        })
        .collect()
}
