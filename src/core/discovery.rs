//! Input file discovery.
//!
//! Each category root is scanned for `*.json` files directly inside it.
//! Files are sorted by name so bundles are reproducible regardless of the
//! order the filesystem lists them in.

use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use tracing::debug;

use crate::error::{BuildError, BuildResult};

/// All content files under `project_dir`, in root order then file-name order
pub fn discover(project_dir: &Path, roots: &[String]) -> BuildResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        files.extend(discover_root(&project_dir.join(root))?);
    }
    Ok(files)
}

/// Content files directly inside one root. A missing root yields nothing.
pub fn discover_root(root_dir: &Path) -> BuildResult<Vec<PathBuf>> {
    if !root_dir.is_dir() {
        debug!(root = %root_dir.display(), "content root not found, skipping");
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/*.json",
        Pattern::escape(&root_dir.to_string_lossy())
    );

    let entries = glob(&pattern).map_err(|e| {
        BuildError::io(
            root_dir,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e.msg),
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            BuildError::io(path, e.into_error())
        })?;
        if path.is_file() {
            files.push(path);
        }
    }

    // Deterministic order matters.
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(root = %root_dir.display(), count = files.len(), "discovered content files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_discovers_sorted_json_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("feats");
        touch(&root.join("b.json"));
        touch(&root.join("a.json"));
        touch(&root.join("notes.md"));
        touch(&root.join("nested").join("c.json"));
        fs::create_dir_all(root.join("dir.json")).unwrap();

        let files = discover_root(&root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_root_order_is_preserved() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("spells").join("a.json"));
        touch(&temp.path().join("feats").join("z.json"));

        let roots = vec![
            "spells".to_string(),
            "missing".to_string(),
            "feats".to_string(),
        ];
        let files = discover(temp.path(), &roots).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("spells/a.json"));
        assert!(files[1].ends_with("feats/z.json"));
    }

    #[test]
    fn test_root_with_glob_characters() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("odd[dir]");
        touch(&root.join("a.json"));

        assert_eq!(discover_root(&root).unwrap().len(), 1);
    }
}
