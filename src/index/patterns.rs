//! Static architecture pattern table
//!
//! Each pattern lists its layers and, per layer, the layers it may depend on.
//! A layer may always depend on modules in the same layer.

/// A known architecture pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub name: &'static str,
    /// `(layer, allowed dependency layers)`
    pub layers: &'static [(&'static str, &'static [&'static str])],
}

pub const FRONTEND: Pattern = Pattern {
    name: "frontend",
    layers: &[
        ("pages", &["components", "layouts", "hooks", "stores"]),
        ("components", &["hooks", "stores"]),
        ("layouts", &["components", "hooks"]),
        ("hooks", &["stores"]),
        ("stores", &[]),
    ],
};

pub const BACKEND: Pattern = Pattern {
    name: "backend",
    layers: &[
        ("controllers", &["services"]),
        ("services", &["repositories"]),
        ("repositories", &["models"]),
        ("models", &[]),
    ],
};

pub const FULLSTACK: Pattern = Pattern {
    name: "fullstack",
    layers: &[
        ("features", &["shared", "core"]),
        ("shared", &["core"]),
        ("core", &[]),
    ],
};

pub const PATTERNS: &[Pattern] = &[FRONTEND, BACKEND, FULLSTACK];

/// Look up a pattern by name
pub fn pattern(name: &str) -> Option<&'static Pattern> {
    PATTERNS.iter().find(|p| p.name == name)
}

/// Layers that `(pattern, layer)` may depend on.
///
/// `None` when the pattern or layer is unknown.
pub fn allowed_dependencies(pattern_name: &str, layer: &str) -> Option<&'static [&'static str]> {
    pattern(pattern_name)?
        .layers
        .iter()
        .find(|(name, _)| *name == layer)
        .map(|(_, allowed)| *allowed)
}

/// Whether a module at `(pattern, layer)` may depend on one at `(dep_pattern, dep_layer)`.
///
/// `None` when the module's own placement is not in the table.
pub fn dependency_allowed(
    (pattern_name, layer): (&str, &str),
    (dep_pattern, dep_layer): (&str, &str),
) -> Option<bool> {
    let allowed = allowed_dependencies(pattern_name, layer)?;

    if dep_pattern != pattern_name {
        return Some(false);
    }
    Some(dep_layer == layer || allowed.contains(&dep_layer))
}

/// All `"pattern.layer"` keys in table order
pub fn layer_keys() -> impl Iterator<Item = String> {
    PATTERNS.iter().flat_map(|p| {
        p.layers
            .iter()
            .map(move |(layer, _)| format!("{}.{layer}", p.name))
    })
}
