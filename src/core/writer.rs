//! Bundle serialization.
//!
//! Bundles are written in two steps: `stage` writes the rendered JSON next to
//! the output, `commit` renames it into place. Validating between the two
//! means a rejected bundle never replaces a good one.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::domain::{Bundle, METADATA_KEY};
use crate::error::{BuildError, BuildResult};

#[derive(Debug, Clone)]
pub struct BundleWriter {
    meta_key: String,
}

impl Default for BundleWriter {
    fn default() -> Self {
        Self::new(METADATA_KEY)
    }
}

impl BundleWriter {
    pub fn new(meta_key: impl Into<String>) -> Self {
        Self {
            meta_key: meta_key.into(),
        }
    }

    pub fn meta_key(&self) -> &str {
        &self.meta_key
    }

    /// Pretty-printed JSON with the metadata block first
    pub fn render(&self, bundle: &Bundle) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&bundle.to_value(&self.meta_key)?)
    }

    /// Write the bundle straight to `output`
    pub async fn write(&self, bundle: &Bundle, output: &Path) -> BuildResult<()> {
        self.stage(bundle, output).await?.commit().await
    }

    /// Write the bundle to a staging file beside `output`
    pub async fn stage(&self, bundle: &Bundle, output: &Path) -> BuildResult<StagedBundle> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildError::io(parent, e))?;
        }

        let rendered = self
            .render(bundle)
            .map_err(|e| BuildError::io(output, e.into()))?;

        let staged = staging_path(output);
        fs::write(&staged, rendered)
            .await
            .map_err(|e| BuildError::io(&staged, e))?;
        debug!(staged = %staged.display(), "staged bundle");

        Ok(StagedBundle {
            staged,
            output: output.to_path_buf(),
        })
    }
}

/// `dist/homebrew-bundle.json` stages as `dist/.homebrew-bundle.json.staged`
fn staging_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "bundle.json".to_string());
    output.with_file_name(format!(".{}.staged", name))
}

/// A rendered bundle waiting to be moved into place
#[derive(Debug)]
pub struct StagedBundle {
    staged: PathBuf,
    output: PathBuf,
}

impl StagedBundle {
    /// Path of the staging file, for validation
    pub fn path(&self) -> &Path {
        &self.staged
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Replace the output with the staged file
    pub async fn commit(self) -> BuildResult<()> {
        fs::rename(&self.staged, &self.output)
            .await
            .map_err(|e| BuildError::io(&self.output, e))
    }

    /// Remove the staging file, leaving any existing output untouched
    pub async fn discard(self) {
        if let Err(e) = fs::remove_file(&self.staged).await {
            debug!(staged = %self.staged.display(), error = %e, "failed to remove staged bundle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BundleMetadata;
    use serde_json::{json, Map, Value};
    use tempfile::TempDir;

    fn bundle() -> Bundle {
        let mut content = Map::new();
        content.insert("feat".to_string(), json!([{"name": "A"}]));
        Bundle {
            metadata: BundleMetadata {
                sources: vec![],
                edition: "2024".to_string(),
                date_added: 10,
                date_last_modified: 20,
            },
            content,
        }
    }

    #[test]
    fn test_staging_path() {
        assert_eq!(
            staging_path(Path::new("dist/homebrew-bundle.json")),
            PathBuf::from("dist/.homebrew-bundle.json.staged")
        );
    }

    #[tokio::test]
    async fn test_write_creates_directory() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("dist").join("nested").join("bundle.json");

        BundleWriter::default().write(&bundle(), &output).await.unwrap();

        let text = tokio::fs::read_to_string(&output).await.unwrap();
        assert!(text.starts_with("{\n  \"metadata\": {"));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["feat"][0]["name"], "A");
        assert!(!staging_path(&output).exists());
    }

    #[tokio::test]
    async fn test_discard_keeps_previous_output() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("bundle.json");
        tokio::fs::write(&output, "previous").await.unwrap();

        let staged = BundleWriter::new("_meta").stage(&bundle(), &output).await.unwrap();
        let staged_text = tokio::fs::read_to_string(staged.path()).await.unwrap();
        assert!(staged_text.contains("\"_meta\""));

        staged.discard().await;
        assert_eq!(tokio::fs::read_to_string(&output).await.unwrap(), "previous");
        assert!(!staging_path(&output).exists());
    }
}
