//! Checkpoints and rollback
//!
//! A checkpoint is an immutable snapshot of every managed artifact: all
//! module records plus the derived graph, summary index and validator
//! report. Snapshots are assembled in a temporary directory and renamed into
//! place, so a half-written checkpoint is never visible.
//!
//! ## Usage
//!
//! ```ignore
//! let store = CheckpointStore::new(&project.root);
//! let mut transaction = store.begin("batch-1")?;
//!
//! // Mutate module records...
//!
//! // On success:
//! transaction.commit();
//!
//! // On regression (or automatically via Drop if not committed):
//! transaction.rollback()?;
//! ```

pub mod manifest;


use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tempfile::TempDir;

use crate::common::fs::{copy_atomic, read_json, relative_files, remove_if_exists, write_json};
use crate::error::{Result, checkpoint as cp_err, fs as fs_err};
use crate::hash;
use crate::project::{CHECKPOINTS_DIR, MODULES_DIR, SNAPSHOT_FILES};

pub use manifest::Manifest;
use manifest::{FILES_DIR, MANIFEST_FILE, from_key, make_id, sanitize_tag, to_key};

/// What a rollback changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackStats {
    /// Files rewritten from the snapshot
    pub restored: usize,
    /// Files removed because they did not exist at checkpoint time
    pub removed: usize,
}

/// Snapshot storage under `checkpoints/`
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    root: PathBuf,
    dir: PathBuf,
    pins: Arc<Mutex<BTreeSet<String>>>,
}

/// Keeps a checkpoint from being garbage-collected while held
#[derive(Debug)]
pub struct PinGuard {
    id: String,
    pins: Arc<Mutex<BTreeSet<String>>>,
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        self.pins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl CheckpointStore {
    /// Store for the project rooted at `root`
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            dir: root.join(CHECKPOINTS_DIR),
            pins: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    /// Snapshot the managed artifacts. Returns the checkpoint id.
    pub fn create_checkpoint(&self, tag: &str) -> Result<String> {
        fs::create_dir_all(&self.dir).map_err(|e| fs_err::write_failed(&self.dir, e))?;

        let created_at = Utc::now();
        let seq = self.next_seq()?;
        let tag = sanitize_tag(tag);
        let id = make_id(created_at, seq, &tag);

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.dir)
            .map_err(|e| cp_err::failed(format!("cannot create staging directory: {e}")))?;

        let mut files = BTreeMap::new();
        for relative in self.managed_files() {
            let key = to_key(&relative);
            let target = staging.path().join(FILES_DIR).join(&relative);
            copy_atomic(&self.root.join(&relative), &target)?;
            files.insert(key, hash::hash_file(&target)?);
        }

        let manifest = Manifest {
            id: id.clone(),
            tag,
            seq,
            created_at,
            files,
        };
        write_json(&staging.path().join(MANIFEST_FILE), &manifest)?;

        self.publish(staging, &id)?;
        tracing::debug!(checkpoint = %id, files = manifest.files.len(), "created checkpoint");

        Ok(id)
    }

    /// Start a transaction guarded by a fresh checkpoint
    pub fn begin(&self, tag: &str) -> Result<CheckpointTransaction> {
        let id = self.create_checkpoint(tag)?;
        Ok(CheckpointTransaction {
            store: self.clone(),
            id,
            committed: false,
        })
    }

    /// Restore every managed artifact to its state at checkpoint `id`.
    ///
    /// The snapshot is verified before anything is touched. Rolling back
    /// twice to the same checkpoint has the same effect as once.
    pub fn rollback_to(&self, id: &str) -> Result<RollbackStats> {
        let _pin = self.pin(id);
        let manifest = self.get(id)?;
        let snapshot = self.dir.join(id);

        manifest.verify(&snapshot)?;

        let mut stats = RollbackStats::default();

        for key in manifest.files.keys() {
            let relative = from_key(key);
            copy_atomic(
                &snapshot.join(FILES_DIR).join(&relative),
                &self.root.join(&relative),
            )?;
            stats.restored += 1;
        }

        for relative in self.managed_files() {
            if !manifest.files.contains_key(&to_key(&relative)) {
                remove_if_exists(&self.root.join(&relative))?;
                stats.removed += 1;
            }
        }
        self.prune_empty_module_dirs();

        tracing::info!(
            checkpoint = %id,
            restored = stats.restored,
            removed = stats.removed,
            "rolled back"
        );
        Ok(stats)
    }

    /// Load the manifest of checkpoint `id`
    pub fn get(&self, id: &str) -> Result<Manifest> {
        if id.is_empty() || id.contains('/') || id.contains('\\') || id.starts_with('.') {
            return Err(cp_err::not_found(id));
        }

        let path = self.dir.join(id).join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(cp_err::not_found(id));
        }

        read_json(&path).map_err(|e| cp_err::corrupted(id, e))
    }

    /// All checkpoints, oldest first
    pub fn list(&self) -> Result<Vec<Manifest>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| fs_err::read_failed(&self.dir, e))?;
        let mut manifests: Vec<Manifest> = entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(ToString::to_string))
            .filter(|name| !name.starts_with('.'))
            .filter_map(|name| match self.get(&name) {
                Ok(manifest) => Some(manifest),
                Err(e) => {
                    tracing::warn!(checkpoint = %name, error = %e, "skipping unreadable checkpoint");
                    None
                }
            })
            .collect();

        manifests.sort_by(|a, b| a.seq.cmp(&b.seq).then_with(|| a.id.cmp(&b.id)));
        Ok(manifests)
    }

    /// Most recent checkpoint
    pub fn latest(&self) -> Result<Option<Manifest>> {
        Ok(self.list()?.pop())
    }

    /// Delete all but the `keep_last` most recent checkpoints
    pub fn cleanup(&self, keep_last: usize) -> Result<Vec<String>> {
        self.cleanup_matching(keep_last, |_| true)
    }

    /// Like [`cleanup`](Self::cleanup), restricted to checkpoints matching `predicate`.
    ///
    /// Pinned checkpoints are never deleted. Returns the removed ids.
    pub fn cleanup_matching<F>(&self, keep_last: usize, predicate: F) -> Result<Vec<String>>
    where
        F: Fn(&Manifest) -> bool,
    {
        let candidates: Vec<Manifest> = self.list()?.into_iter().filter(|m| predicate(m)).collect();
        let excess = candidates.len().saturating_sub(keep_last);
        let pinned = self
            .pins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut removed = Vec::new();
        for manifest in candidates.into_iter().take(excess) {
            if pinned.contains(&manifest.id) {
                tracing::debug!(checkpoint = %manifest.id, "keeping pinned checkpoint");
                continue;
            }

            let path = self.dir.join(&manifest.id);
            fs::remove_dir_all(&path).map_err(|e| fs_err::write_failed(&path, e))?;
            removed.push(manifest.id);
        }

        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "removed old checkpoints");
        }
        Ok(removed)
    }

    /// Protect checkpoint `id` from cleanup while the guard lives
    pub fn pin(&self, id: &str) -> PinGuard {
        self.pins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string());
        PinGuard {
            id: id.to_string(),
            pins: Arc::clone(&self.pins),
        }
    }

    /// Project-relative paths of the artifacts a checkpoint captures
    fn managed_files(&self) -> Vec<PathBuf> {
        let modules = Path::new(MODULES_DIR);
        let mut files: Vec<PathBuf> = relative_files(&self.root.join(MODULES_DIR))
            .into_iter()
            .map(|relative| modules.join(relative))
            .collect();

        files.extend(
            SNAPSHOT_FILES
                .iter()
                .map(PathBuf::from)
                .filter(|relative| self.root.join(relative).is_file()),
        );
        files
    }

    fn next_seq(&self) -> Result<u64> {
        Ok(self.list()?.last().map_or(1, |m| m.seq + 1))
    }

    fn publish(&self, staging: TempDir, id: &str) -> Result<()> {
        let target = self.dir.join(id);
        if target.exists() {
            return Err(cp_err::failed(format!("checkpoint {id} already exists")));
        }

        let staged = staging.keep();
        fs::rename(&staged, &target).map_err(|e| {
            let _ = fs::remove_dir_all(&staged);
            cp_err::failed(format!("cannot publish checkpoint {id}: {e}"))
        })
    }

    fn prune_empty_module_dirs(&self) {
        let Ok(entries) = fs::read_dir(self.root.join(MODULES_DIR)) else {
            return;
        };

        for entry in entries.filter_map(std::result::Result::ok) {
            let path = entry.path();
            let is_empty = fs::read_dir(&path)
                .map(|mut d| d.next().is_none())
                .unwrap_or(false);
            if path.is_dir() && is_empty {
                let _ = fs::remove_dir(&path);
            }
        }
    }
}

/// A batch of mutations that can be undone by restoring its checkpoint
///
/// Rolls back automatically on drop unless committed.
#[derive(Debug)]
pub struct CheckpointTransaction {
    store: CheckpointStore,
    id: String,
    committed: bool,
}

impl CheckpointTransaction {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Keep the mutations
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// Restore the checkpoint
    pub fn rollback(mut self) -> Result<RollbackStats> {
        self.committed = true;
        self.store.rollback_to(&self.id)
    }
}

impl Drop for CheckpointTransaction {
    fn drop(&mut self) {
        if !self.committed {
            // Automatic rollback on drop if not committed
            if let Err(e) = self.store.rollback_to(&self.id) {
                tracing::warn!(checkpoint = %self.id, error = %e, "automatic rollback failed");
            }
        }
    }
}
