//! Project management for archfix
//!
//! This module handles:
//! - Project detection and initialization
//! - Project locking for the duration of a repair run
//!
//! ## Project Structure
//!
//! ```text
//! <project>/
//! ├── archfix.yaml              # Optional configuration
//! ├── modules/<name>/full_summary.json
//! ├── dependency_graph.json     # Derived graph
//! ├── summary_index.json        # Derived name -> {target_path, depends_on}
//! ├── validator_report.json     # Last structured report
//! ├── checkpoints/<id>/         # Snapshots
//! ├── logs/<run-id>/            # Repair audit trail
//! └── .lock                     # Advisory lock file
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use fslock::LockFile;

use crate::common::fs::atomic_write;
use crate::config::{ArchfixConfig, CONFIG_FILE};
use crate::domain::Module;
use crate::error::{ArchfixError, Result, fs as fs_err};
use crate::graph::DependencyGraph;
use crate::store::{FsModuleRepository, ModuleRepository, SummaryIndex};
use crate::validator::ValidatorReport;

/// Module records directory name
pub const MODULES_DIR: &str = "modules";

/// Serialized dependency graph filename
pub const GRAPH_FILE: &str = "dependency_graph.json";

/// Summary index filename
pub const SUMMARY_INDEX_FILE: &str = "summary_index.json";

/// Validator report filename
pub const REPORT_FILE: &str = "validator_report.json";

/// Checkpoints directory name
pub const CHECKPOINTS_DIR: &str = "checkpoints";

/// Repair logs directory name
pub const LOGS_DIR: &str = "logs";

/// Lock file for project locking
pub const LOCK_FILE: &str = ".lock";

/// Top-level artifacts captured by checkpoints, besides `modules/`
pub const SNAPSHOT_FILES: &[&str] = &[GRAPH_FILE, SUMMARY_INDEX_FILE, REPORT_FILE];

/// Represents an archfix project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (where modules/ is located)
    pub root: PathBuf,

    /// Configuration (archfix.yaml)
    pub config: ArchfixConfig,
}

/// RAII guard for project locking
///
/// Acquires an advisory file lock on creation and releases it on drop.
/// This prevents two repair runs from mutating the same project.
#[derive(Debug)]
pub struct ProjectGuard {
    lock: LockFile,
    lock_path: PathBuf,
}

impl Project {
    /// Detect if a project exists at the given path
    pub fn exists(root: &Path) -> bool {
        root.join(MODULES_DIR).is_dir()
    }

    /// Find a project by searching upward from the given path
    pub fn find_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if Self::exists(&current) {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Locate the project for a command: explicit path or upward search from cwd
    pub fn locate(explicit: Option<PathBuf>) -> Result<Self> {
        let start = match explicit {
            Some(path) => path,
            None => std::env::current_dir()?,
        };

        let root = Self::find_from(&start).ok_or_else(|| ArchfixError::ProjectNotFound {
            path: start.display().to_string(),
        })?;

        Self::open(&root)
    }

    /// Open an existing project
    pub fn open(root: &Path) -> Result<Self> {
        if !Self::exists(root) {
            return Err(ArchfixError::ProjectNotFound {
                path: root.display().to_string(),
            });
        }

        let config = ArchfixConfig::load(root)?;
        tracing::debug!(root = %root.display(), "opened project");

        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    /// Initialize a new project at the given path
    ///
    /// Creates the directory skeleton and a commented default `archfix.yaml`.
    /// Existing files are left untouched.
    pub fn init(root: &Path) -> Result<Self> {
        for dir in [MODULES_DIR, CHECKPOINTS_DIR, LOGS_DIR] {
            let path = root.join(dir);
            fs::create_dir_all(&path).map_err(|e| fs_err::write_failed(&path, e))?;
        }

        let gitignore_path = root.join(".gitignore");
        if !gitignore_path.exists() {
            atomic_write(&gitignore_path, b".lock\ncheckpoints/\nlogs/\n")?;
        }

        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            let yaml = ArchfixConfig::default().to_yaml()?;
            atomic_write(&config_path, yaml.as_bytes())?;
        }

        Self::open(root)
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.root.join(MODULES_DIR)
    }

    pub fn graph_path(&self) -> PathBuf {
        self.root.join(GRAPH_FILE)
    }

    pub fn summary_index_path(&self) -> PathBuf {
        self.root.join(SUMMARY_INDEX_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    pub fn checkpoints_dir(&self) -> PathBuf {
        self.root.join(CHECKPOINTS_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Module store backed by `modules/`
    pub fn repository(&self) -> FsModuleRepository {
        FsModuleRepository::new(self.modules_dir())
    }

    /// Rewrite the derived graph and summary index from the module records
    pub fn persist_derived<'a, I>(&self, modules: I, graph: &DependencyGraph) -> Result<()>
    where
        I: IntoIterator<Item = &'a Module>,
    {
        graph.save(&self.graph_path())?;
        SummaryIndex::from_modules(modules).save(&self.summary_index_path())
    }

    /// Load the last validator report
    pub fn load_report(&self) -> Result<ValidatorReport> {
        ValidatorReport::load(&self.report_path())
    }

    /// Acquire the project lock (blocking)
    pub fn lock(&self) -> Result<ProjectGuard> {
        ProjectGuard::acquire(&self.root)
    }
}

impl ProjectGuard {
    /// Acquire a lock on the project
    pub fn acquire(root: &Path) -> Result<Self> {
        let (mut lock, lock_path) = Self::open_lock(root)?;

        // Blocking acquire
        lock.lock().map_err(|_| ArchfixError::ProjectLocked)?;

        Ok(Self { lock, lock_path })
    }

    /// Try to acquire a lock without blocking
    pub fn try_acquire(root: &Path) -> Result<Option<Self>> {
        let (mut lock, lock_path) = Self::open_lock(root)?;

        let acquired = lock
            .try_lock()
            .map_err(|e| ArchfixError::ProjectLockFailed {
                reason: format!("Failed to try lock: {e}"),
            })?;

        if acquired {
            Ok(Some(Self { lock, lock_path }))
        } else {
            Ok(None)
        }
    }

    fn open_lock(root: &Path) -> Result<(LockFile, PathBuf)> {
        if !Project::exists(root) {
            return Err(ArchfixError::ProjectNotFound {
                path: root.display().to_string(),
            });
        }

        let lock_path = root.join(LOCK_FILE);
        let lock = LockFile::open(&lock_path).map_err(|e| ArchfixError::ProjectLockFailed {
            reason: format!("Failed to open lock file: {e}"),
        })?;

        Ok((lock, lock_path))
    }
}

impl Drop for ProjectGuard {
    fn drop(&mut self) {
        // Release the lock
        let _ = self.lock.unlock();

        // Remove the lock file - it will be recreated when needed
        let _ = fs::remove_file(&self.lock_path);
    }
}
