//! Checkpoint manifest
//!
//! Each snapshot directory holds the copied artifacts under `files/` and a
//! `manifest.json` naming every copied file with its BLAKE3 hash. Artifacts
//! missing from the manifest did not exist when the checkpoint was taken.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, checkpoint as cp_err};
use crate::hash;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const FILES_DIR: &str = "files";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub id: String,
    pub tag: String,
    /// Monotonic sequence number within the project
    pub seq: u64,
    pub created_at: DateTime<Utc>,
    /// Project-relative path (`/`-separated) -> content hash
    pub files: BTreeMap<String, String>,
}

impl Manifest {
    /// Check every snapshot file against its recorded hash
    pub fn verify(&self, snapshot_dir: &Path) -> Result<()> {
        for (relative, expected) in &self.files {
            let path = snapshot_dir.join(FILES_DIR).join(from_key(relative));
            if !path.is_file() {
                return Err(cp_err::corrupted(
                    &self.id,
                    format!("snapshot file {relative} is missing"),
                ));
            }

            let actual = hash::hash_file(&path)?;
            if !hash::verify_hash(expected, &actual) {
                return Err(cp_err::corrupted(
                    &self.id,
                    format!("hash mismatch for {relative}"),
                ));
            }
        }
        Ok(())
    }
}

/// Manifest key for a project-relative path
pub fn to_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Project-relative path for a manifest key
pub fn from_key(key: &str) -> PathBuf {
    key.split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect()
}

/// Reduce a free-form tag to characters safe in a directory name
pub fn sanitize_tag(tag: &str) -> String {
    let cleaned: String = tag
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "checkpoint".to_string()
    } else {
        cleaned
    }
}

/// Build a checkpoint id: `<UTC timestamp>_<seq>_<tag>`
pub fn make_id(created_at: DateTime<Utc>, seq: u64, tag: &str) -> String {
    format!("{}_{seq:04}_{tag}", created_at.format("%Y%m%dT%H%M%S%3fZ"))
}
