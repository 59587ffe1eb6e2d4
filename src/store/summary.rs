//! Compact module index (`summary_index.json`)
//!
//! Maps each module name to its target path and dependencies. Derived from
//! the module records and rewritten whenever they change.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::fs::write_json;
use crate::domain::Module;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub target_path: String,
    pub depends_on: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryIndex(pub BTreeMap<String, SummaryEntry>);

impl SummaryIndex {
    pub fn from_modules<'a, I>(modules: I) -> Self
    where
        I: IntoIterator<Item = &'a Module>,
    {
        Self(
            modules
                .into_iter()
                .map(|m| {
                    let entry = SummaryEntry {
                        target_path: m.target_path.clone(),
                        depends_on: m.depends_on.clone(),
                    };
                    (m.name.clone(), entry)
                })
                .collect(),
        )
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}
