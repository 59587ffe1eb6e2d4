//! JSON form of the dependency graph (`dependency_graph.json`)
//!
//! ```json
//! {
//!   "UserService": { "depends_on": ["UserRepository"], "depended_by": ["UserController"] }
//! }
//! ```
//!
//! `depended_by` is written for readers of the file and ignored on load.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DependencyGraph, Node};
use crate::common::fs::{read_json, write_json};
use crate::error::Result;

/// Serialized graph keyed by module name
pub type GraphDocument = BTreeMap<String, NodeRecord>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub depends_on: Vec<String>,

    #[serde(default, skip_deserializing)]
    pub depended_by: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

impl DependencyGraph {
    pub fn to_document(&self) -> GraphDocument {
        self.nodes
            .iter()
            .map(|(name, node)| {
                let record = NodeRecord {
                    depends_on: node.depends_on.iter().cloned().collect(),
                    depended_by: self.dependents(name).into_iter().collect(),
                    placeholder: node.placeholder,
                };
                (name.clone(), record)
            })
            .collect()
    }

    pub fn from_document(document: GraphDocument) -> Self {
        let mut graph = Self::new();

        for (name, record) in document {
            graph.nodes.insert(
                name,
                Node {
                    depends_on: record.depends_on.into_iter().collect(),
                    placeholder: record.placeholder,
                },
            );
        }

        // Dependencies missing from the file still need a node
        let referenced: Vec<String> = graph
            .nodes
            .values()
            .flat_map(|n| n.depends_on.iter().cloned())
            .filter(|dep| !graph.nodes.contains_key(dep))
            .collect();
        for dep in referenced {
            graph.nodes.insert(
                dep,
                Node {
                    placeholder: true,
                    ..Node::default()
                },
            );
        }

        graph
    }

    /// Write the graph to `path` atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, &self.to_document())
    }

    /// Load a graph previously written by [`DependencyGraph::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let document: GraphDocument = read_json(path)?;
        Ok(Self::from_document(document))
    }
}
