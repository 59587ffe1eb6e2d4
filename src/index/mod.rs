//! Architecture index
//!
//! Derived lookup tables over the module set. The index is never a source of
//! truth: [`ArchitectureIndex::build`] is pure and is re-run whenever the
//! module set changes.

pub mod patterns;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::Module;

/// Modules and patterns claiming a responsibility
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponsibilityEntry {
    pub modules: BTreeSet<String>,
    pub patterns: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchitectureIndex {
    /// requirement -> modules
    pub requirements: BTreeMap<String, BTreeSet<String>>,
    /// responsibility text -> modules and patterns
    pub responsibilities: BTreeMap<String, ResponsibilityEntry>,
    /// lowercase keyword -> modules
    pub keywords: BTreeMap<String, BTreeSet<String>>,
    /// `"pattern.layer"` -> module name -> record
    pub layers: BTreeMap<String, BTreeMap<String, Module>>,
}

impl ArchitectureIndex {
    /// Build the index from scratch
    pub fn build<'a, I>(modules: I) -> Self
    where
        I: IntoIterator<Item = &'a Module>,
    {
        let mut index = Self {
            layers: patterns::layer_keys()
                .map(|key| (key, BTreeMap::new()))
                .collect(),
            ..Self::default()
        };

        for module in modules {
            index.add(module);
        }
        index
    }

    fn add(&mut self, module: &Module) {
        let name = &module.name;

        for requirement in &module.requirements {
            self.requirements
                .entry(requirement.clone())
                .or_default()
                .insert(name.clone());
        }

        for responsibility in &module.responsibilities {
            let entry = self
                .responsibilities
                .entry(responsibility.clone())
                .or_default();
            entry.modules.insert(name.clone());
            entry
                .patterns
                .insert(module.pattern.clone().unwrap_or_default());

            for keyword in responsibility.split_whitespace() {
                self.keywords
                    .entry(keyword.to_lowercase())
                    .or_default()
                    .insert(name.clone());
            }
        }

        if let Some((pattern, layer)) = module.placement() {
            let key = format!("{pattern}.{layer}");
            if let Some(members) = self.layers.get_mut(&key) {
                members.insert(name.clone(), module.clone());
            }
        }
    }

    /// Modules claiming exactly this responsibility text
    pub fn modules_with_responsibility(&self, responsibility: &str) -> Option<&BTreeSet<String>> {
        self.responsibilities.get(responsibility).map(|e| &e.modules)
    }
}
