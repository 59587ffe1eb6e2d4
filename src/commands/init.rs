//! Init command implementation

use std::path::PathBuf;

use crate::error::Result;
use crate::project::Project;

/// Create the project layout in the given directory (or the current one)
pub fn run(project: Option<PathBuf>) -> Result<()> {
    let root = match project {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let existed = Project::exists(&root);
    let project = Project::init(&root)?;

    if existed {
        println!("Project already initialized at {}", project.root.display());
    } else {
        println!("Initialized archfix project at {}", project.root.display());
    }
    println!("Module records go in {}/<name>/full_summary.json", project.modules_dir().display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_twice() {
        let temp = TempDir::new().unwrap();
        run(Some(temp.path().to_path_buf())).unwrap();
        run(Some(temp.path().to_path_buf())).unwrap();
        assert!(Project::exists(temp.path()));
    }
}
