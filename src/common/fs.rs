//! Common file system operations with unified error handling

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::error::{Result, fs as fs_err};

/// Write `content` to `path` through a temp file in the same directory and an atomic rename
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| fs_err::write_failed(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| fs_err::write_failed(path, e))?;
    temp.write_all(content)
        .map_err(|e| fs_err::write_failed(path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| fs_err::write_failed(path, e))?;
    temp.persist(path)
        .map_err(|e| fs_err::write_failed(path, e.error))?;

    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut content =
        serde_json::to_vec_pretty(value).map_err(|e| fs_err::write_failed(path, e))?;
    content.push(b'\n');
    atomic_write(path, &content)
}

/// Read and deserialize a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read(path).map_err(|e| fs_err::read_failed(path, e))?;
    serde_json::from_slice(&content).map_err(|e| fs_err::read_failed(path, e))
}

/// Copy a single file atomically, creating parent directories
pub fn copy_atomic(src: &Path, dst: &Path) -> Result<()> {
    let content = fs::read(src).map_err(|e| fs_err::read_failed(src, e))?;
    atomic_write(dst, &content)
}

/// List regular files under `root`, relative to it, sorted
pub fn relative_files(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}

/// Remove `path` if it exists; a missing file is not an error
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(fs_err::write_failed(path, e)),
    }
}
