//! Module record persistence
//!
//! Records live one per directory:
//!
//! ```text
//! modules/
//! ├── UserService/full_summary.json
//! └── UserRepository/full_summary.json
//! ```
//!
//! Access goes through the [`ModuleRepository`] trait. [`FsModuleRepository`]
//! is the flat-file implementation; every write is a temp file plus rename.

pub mod summary;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::fs::{atomic_write, write_json};
use crate::domain::Module;
use crate::error::{ArchfixError, Result, fs as fs_err};

pub use summary::{SummaryEntry, SummaryIndex};

/// File name of a module record inside its directory
pub const RECORD_FILE: &str = "full_summary.json";

/// Result of loading every record in a store
#[derive(Debug, Clone, Default)]
pub struct LoadedModules {
    pub modules: BTreeMap<String, Module>,
    /// Records that exist but could not be read, with the reason
    pub failures: BTreeMap<String, String>,
}

/// Storage for module records
pub trait ModuleRepository {
    /// Load a single record
    fn get(&self, name: &str) -> Result<Module>;

    /// Create or replace a record
    fn put(&self, module: &Module) -> Result<()>;

    /// Names of all stored records, sorted
    fn list(&self) -> Result<Vec<String>>;

    /// Delete a record; deleting a missing record is not an error
    fn delete(&self, name: &str) -> Result<()>;

    /// Load every record, collecting unreadable ones as failures
    fn load_all(&self) -> Result<LoadedModules> {
        let mut loaded = LoadedModules::default();

        for name in self.list()? {
            match self.get(&name) {
                Ok(module) => {
                    loaded.modules.insert(name, module);
                }
                Err(e) => {
                    tracing::warn!(module = %name, error = %e, "failed to load module record");
                    loaded.failures.insert(name, e.to_string());
                }
            }
        }

        Ok(loaded)
    }
}

/// Reject names that cannot be used as a directory name
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.contains('/') || name.contains('\\') {
        Some("name contains a path separator")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ArchfixError::InvalidModuleName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Flat-file module store rooted at a `modules/` directory
#[derive(Debug, Clone)]
pub struct FsModuleRepository {
    root: PathBuf,
}

impl FsModuleRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file for `name`
    pub fn record_path(&self, name: &str) -> PathBuf {
        self.root.join(name).join(RECORD_FILE)
    }

    /// Write the raw bytes of a record, bypassing serialization
    pub fn put_raw(&self, name: &str, content: &[u8]) -> Result<()> {
        validate_name(name)?;
        atomic_write(&self.record_path(name), content)
    }
}

impl ModuleRepository for FsModuleRepository {
    fn get(&self, name: &str) -> Result<Module> {
        validate_name(name)?;
        let path = self.record_path(name);

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArchfixError::ModuleNotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(fs_err::read_failed(&path, e)),
        };

        let mut module: Module =
            serde_json::from_slice(&content).map_err(|e| ArchfixError::ModuleParseFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        // The directory name is the identity
        if module.name != name {
            tracing::debug!(
                module = %name,
                recorded = %module.name,
                "module_name differs from directory, using directory name"
            );
            module.name = name.to_string();
        }

        Ok(module)
    }

    fn put(&self, module: &Module) -> Result<()> {
        validate_name(&module.name)?;
        write_json(&self.record_path(&module.name), module)
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(|e| fs_err::read_failed(&self.root, e))?;

        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.path().join(RECORD_FILE).is_file())
            .filter_map(|entry| entry.file_name().to_str().map(ToString::to_string))
            .collect();
        names.sort();

        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let dir = self.root.join(name);
        if !dir.exists() {
            return Ok(());
        }

        fs::remove_dir_all(&dir).map_err(|e| fs_err::write_failed(&dir, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FsModuleRepository) {
        let temp = TempDir::new().unwrap();
        let repo = FsModuleRepository::new(temp.path().join("modules"));
        (temp, repo)
    }

    #[test]
    fn test_put_and_get() {
        let (_temp, repo) = store();
        let module = Module::new("UserService").with_depends_on(["UserRepository"]);

        repo.put(&module).unwrap();
        assert!(repo.record_path("UserService").is_file());
        assert_eq!(repo.get("UserService").unwrap(), module);
    }

    #[test]
    fn test_get_missing() {
        let (_temp, repo) = store();
        let err = repo.get("Nope").unwrap_err();
        assert!(matches!(err, ArchfixError::ModuleNotFound { .. }));
    }

    #[test]
    fn test_get_malformed() {
        let (_temp, repo) = store();
        repo.put_raw("Broken", b"{ not json").unwrap();

        let err = repo.get("Broken").unwrap_err();
        assert!(matches!(err, ArchfixError::ModuleParseFailed { .. }));
    }

    #[test]
    fn test_directory_name_wins() {
        let (_temp, repo) = store();
        repo.put_raw("Real", br#"{"module_name": "Alias"}"#).unwrap();

        assert_eq!(repo.get("Real").unwrap().name, "Real");
    }

    #[test]
    fn test_list_sorted_and_skips_empty_dirs() {
        let (_temp, repo) = store();
        repo.put(&Module::new("B")).unwrap();
        repo.put(&Module::new("A")).unwrap();
        fs::create_dir_all(repo.root().join("EmptyDir")).unwrap();

        assert_eq!(repo.list().unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_list_missing_root() {
        let (_temp, repo) = store();
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let (_temp, repo) = store();
        repo.put(&Module::new("Gone")).unwrap();
        repo.delete("Gone").unwrap();
        repo.delete("Gone").unwrap();

        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn test_load_all_collects_failures() {
        let (_temp, repo) = store();
        repo.put(&Module::new("Good")).unwrap();
        repo.put_raw("Bad", b"[1, 2").unwrap();

        let loaded = repo.load_all().unwrap();
        assert!(loaded.modules.contains_key("Good"));
        assert!(loaded.failures.contains_key("Bad"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let (_temp, repo) = store();
        assert!(repo.put(&Module::new("../escape")).is_err());
        assert!(repo.get("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("Fine").is_ok());
    }
}
