//! Module record domain type
//!
//! A module record is the unit stored under `modules/<name>/full_summary.json`.
//! List fields accept either a JSON array or a single string on read, so that
//! hand-edited records and loosely shaped proposals still load.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

/// Fields every stored module record must carry
pub const REQUIRED_FIELDS: &[&str] = &[
    "module_name",
    "responsibilities",
    "key_apis",
    "data_inputs",
    "data_outputs",
    "depends_on",
    "target_path",
];

/// A named module specification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Unique module name
    #[serde(rename = "module_name")]
    pub name: String,

    #[serde(default, deserialize_with = "string_or_seq")]
    pub responsibilities: Vec<String>,

    #[serde(default, deserialize_with = "string_or_seq")]
    pub key_apis: Vec<String>,

    #[serde(default, deserialize_with = "string_or_seq")]
    pub data_inputs: Vec<String>,

    #[serde(default, deserialize_with = "string_or_seq")]
    pub data_outputs: Vec<String>,

    /// Names of the modules this one depends on
    #[serde(default, deserialize_with = "string_or_set")]
    pub depends_on: BTreeSet<String>,

    #[serde(default)]
    pub target_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Requirement ids or texts this module satisfies
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_seq"
    )]
    pub requirements: Vec<String>,
}

impl Module {
    /// Create an empty record with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style helper to set dependencies
    #[must_use]
    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style helper to set responsibilities
    #[must_use]
    pub fn with_responsibilities<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responsibilities = items.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style helper to set pattern and layer
    #[must_use]
    pub fn with_layer(mut self, pattern: impl Into<String>, layer: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self.layer = Some(layer.into());
        self
    }

    /// Returns the `(pattern, layer)` pair when both are declared and non-empty
    pub fn placement(&self) -> Option<(&str, &str)> {
        match (self.pattern.as_deref(), self.layer.as_deref()) {
            (Some(pattern), Some(layer)) if !pattern.is_empty() && !layer.is_empty() => {
                Some((pattern, layer))
            }
            _ => None,
        }
    }

    /// Names of required content fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.responsibilities.is_empty() {
            missing.push("responsibilities");
        }
        if self.key_apis.is_empty() {
            missing.push("key_apis");
        }
        if self.data_inputs.is_empty() {
            missing.push("data_inputs");
        }
        if self.data_outputs.is_empty() {
            missing.push("data_outputs");
        }
        if self.target_path.trim().is_empty() {
            missing.push("target_path");
        }
        missing
    }

    /// Fill optional fields the proposal left out from the original record
    pub fn inherit_optional(&mut self, original: &Module) {
        if self.layer.is_none() {
            self.layer.clone_from(&original.layer);
        }
        if self.pattern.is_none() {
            self.pattern.clone_from(&original.pattern);
        }
        if self.domain.is_none() {
            self.domain.clone_from(&original.domain);
        }
        if self.requirements.is_empty() {
            self.requirements.clone_from(&original.requirements);
        }
        if self.target_path.trim().is_empty() {
            self.target_path.clone_from(&original.target_path);
        }
    }
}

/// Strip common role suffixes so `UserController` and `UserService` share a stem
pub fn name_stem(name: &str) -> &str {
    const SUFFIXES: &[&str] = &["Controller", "Service", "Repository", "Page", "Model"];

    for suffix in SUFFIXES {
        if let Some(stem) = name.strip_suffix(suffix) {
            if !stem.is_empty() {
                return stem;
            }
        }
    }
    name
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
    Null(()),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) if s.trim().is_empty() => Vec::new(),
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
            OneOrMany::Null(()) => Vec::new(),
        }
    }
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    OneOrMany::deserialize(deserializer).map(OneOrMany::into_vec)
}

fn string_or_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = OneOrMany::deserialize(deserializer)?.into_vec();
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{
            "module_name": "UserService",
            "responsibilities": ["Manage users", "Validate credentials"],
            "key_apis": ["create_user"],
            "data_inputs": ["UserForm"],
            "data_outputs": ["User"],
            "depends_on": ["UserRepository"],
            "target_path": "src/services/user.py",
            "layer": "services",
            "pattern": "backend"
        }"#;

        let module: Module = serde_json::from_str(json).unwrap();
        assert_eq!(module.name, "UserService");
        assert_eq!(module.responsibilities.len(), 2);
        assert!(module.depends_on.contains("UserRepository"));
        assert_eq!(module.placement(), Some(("backend", "services")));
        assert!(module.missing_fields().is_empty());
    }

    #[test]
    fn test_deserialize_coerces_strings_to_lists() {
        let json = r#"{
            "module_name": "Cart",
            "responsibilities": "Track items",
            "depends_on": "Catalog",
            "key_apis": null
        }"#;

        let module: Module = serde_json::from_str(json).unwrap();
        assert_eq!(module.responsibilities, vec!["Track items".to_string()]);
        assert!(module.depends_on.contains("Catalog"));
        assert!(module.key_apis.is_empty());
    }

    #[test]
    fn test_serialize_writes_required_fields() {
        let module = Module::new("Solo");
        let value = serde_json::to_value(&module).unwrap();
        for field in REQUIRED_FIELDS {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert!(value.get("layer").is_none());
        assert!(value.get("requirements").is_none());
    }

    #[test]
    fn test_missing_fields() {
        let module = Module::new("Empty").with_responsibilities(["Do things"]);
        assert_eq!(
            module.missing_fields(),
            vec!["key_apis", "data_inputs", "data_outputs", "target_path"]
        );
    }

    #[test]
    fn test_placement_requires_both() {
        let mut module = Module::new("Half");
        module.layer = Some("services".to_string());
        assert_eq!(module.placement(), None);
    }

    #[test]
    fn test_inherit_optional() {
        let original = Module::new("A").with_layer("backend", "services");
        let mut proposal = Module::new("A");
        proposal.inherit_optional(&original);
        assert_eq!(proposal.placement(), Some(("backend", "services")));
    }

    #[test]
    fn test_name_stem() {
        assert_eq!(name_stem("UserController"), "User");
        assert_eq!(name_stem("UserService"), "User");
        assert_eq!(name_stem("OrderRepository"), "Order");
        assert_eq!(name_stem("Service"), "Service");
        assert_eq!(name_stem("Billing"), "Billing");
    }
}
