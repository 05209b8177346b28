//! Append-only debug log for validator diagnostics.
//!
//! Ignored failures are kept out of the primary output and written here
//! instead, as are the full diagnostics of fatal failures. Writing to the
//! side log is best-effort: a failure is reported as a warning and never
//! changes the build result.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::domain::Artifact;

/// Default file name, placed in the system temp directory
pub const DEFAULT_SIDE_LOG: &str = "bundle-validate.log";

/// Tag for a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTag {
    Ignored,
    Fatal,
}

impl EntryTag {
    fn as_str(self) -> &'static str {
        match self {
            EntryTag::Ignored => "IGNORED",
            EntryTag::Fatal => "FATAL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SideLog {
    path: Option<PathBuf>,
}

impl SideLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A side log that discards everything
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_SIDE_LOG)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one entry, e.g. `[IGNORED][file=races/elf.json]` followed by the text
    pub async fn append(&self, tag: EntryTag, artifact: &Artifact, text: &str) {
        let Some(path) = &self.path else {
            return;
        };

        let entry = format_entry(tag, artifact, text);
        if let Err(e) = append_to(path, &entry).await {
            warn!(side_log = %path.display(), error = %e, "Failed to write side log");
        }
    }
}

fn format_entry(tag: EntryTag, artifact: &Artifact, text: &str) -> String {
    format!(
        "\n[{}][{}={}]\n{}\n",
        tag.as_str(),
        artifact.kind(),
        artifact.path().display(),
        text
    )
}

async fn append_to(path: &Path, entry: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(entry.as_bytes()).await?;
    file.flush().await
}
