//! Common test utilities for archfix integration tests

use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

/// A test project for integration tests
#[allow(dead_code)]
pub struct TestProject {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to project root
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestProject {
    /// Create an empty directory (no project layout yet)
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Create a directory with the `modules/` layout
    pub fn initialized() -> Self {
        let project = Self::new();
        std::fs::create_dir_all(project.path.join("modules"))
            .expect("Failed to create modules directory");
        project
    }

    /// Write a complete module record depending on `deps`
    pub fn add_module(&self, name: &str, deps: &[&str]) -> &Self {
        let record = json!({
            "module_name": name,
            "responsibilities": [format!("Handle {name} work")],
            "key_apis": [format!("{}_api", name.to_lowercase())],
            "data_inputs": ["Request"],
            "data_outputs": ["Response"],
            "depends_on": deps,
            "target_path": format!("src/{}.rs", name.to_lowercase()),
        });
        self.write_record(
            name,
            &serde_json::to_string_pretty(&record).expect("Failed to serialize record"),
        );
        self
    }

    /// Write raw record content for `name`
    pub fn write_record(&self, name: &str, content: &str) {
        self.write_file(&format!("modules/{name}/full_summary.json"), content);
    }

    /// Parsed record of `name`
    pub fn read_record(&self, name: &str) -> serde_json::Value {
        serde_json::from_str(&self.read_file(&format!("modules/{name}/full_summary.json")))
            .expect("Failed to parse record")
    }

    /// Write a file in the project
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from the project
    pub fn read_file(&self, path: &str) -> String {
        let file_path = self.path.join(path);
        std::fs::read_to_string(&file_path).expect("Failed to read file")
    }

    /// Check if a file exists in the project
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Checkpoint ids currently on disk, sorted
    pub fn checkpoint_ids(&self) -> Vec<String> {
        list_dirs(&self.path.join("checkpoints"))
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-hidden subdirectory names, sorted
fn list_dirs(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| !n.starts_with('.'))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_creation() {
        let project = TestProject::initialized();
        assert!(project.file_exists("modules"));
    }

    #[test]
    fn test_add_module_writes_record() {
        let project = TestProject::initialized();
        project.add_module("A", &["B"]);

        let record = project.read_record("A");
        assert_eq!(record["module_name"], "A");
        assert_eq!(record["depends_on"], json!(["B"]));
    }
}
