//! Last-modified time sources.
//!
//! `GitTimestamps` prefers the committer time of the last commit touching a
//! file and falls back to the filesystem mtime for untracked files or when
//! git is not available.

use std::path::Path;
use std::process::Stdio;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use tokio::process::Command;

use super::TimestampOracle;

/// Git commit time, then filesystem mtime
#[derive(Debug, Clone, Copy, Default)]
pub struct GitTimestamps;

/// Filesystem mtime only
#[derive(Debug, Clone, Copy, Default)]
pub struct MtimeTimestamps;

/// Never reports a time
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTimestamps;

#[async_trait]
impl TimestampOracle for GitTimestamps {
    async fn last_modified(&self, path: &Path) -> Option<i64> {
        match git_last_commit(path).await {
            Some(ts) => Some(ts),
            None => fs_mtime(path).await,
        }
    }
}

#[async_trait]
impl TimestampOracle for MtimeTimestamps {
    async fn last_modified(&self, path: &Path) -> Option<i64> {
        fs_mtime(path).await
    }
}

#[async_trait]
impl TimestampOracle for NoTimestamps {
    async fn last_modified(&self, _path: &Path) -> Option<i64> {
        None
    }
}

/// Committer time (unix seconds) of the last commit touching `path`
pub async fn git_last_commit(path: &Path) -> Option<i64> {
    // Run inside the file's directory so nested repositories resolve
    let path = tokio::fs::canonicalize(path).await.ok()?;
    let mut command = Command::new("git");
    command
        .args(["log", "-1", "--format=%ct", "--"])
        .arg(&path)
        .stdin(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = path.parent() {
        command.current_dir(dir);
    }

    let output = command.output().await.ok()?;
    if !output.status.success() {
        return None;
    }

    // Untracked files produce empty output
    parse_commit_time(&String::from_utf8_lossy(&output.stdout))
}

fn parse_commit_time(stdout: &str) -> Option<i64> {
    stdout.trim().parse::<i64>().ok().filter(|ts| *ts > 0)
}

/// Filesystem modification time in whole seconds
pub async fn fs_mtime(path: &Path) -> Option<i64> {
    let modified = tokio::fs::metadata(path).await.ok()?.modified().ok()?;
    let secs = modified.duration_since(UNIX_EPOCH).ok()?.as_secs();
    i64::try_from(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commit_time() {
        assert_eq!(parse_commit_time("1700000000\n"), Some(1_700_000_000));
        assert_eq!(parse_commit_time(""), None);
        assert_eq!(parse_commit_time("0"), None);
        assert_eq!(parse_commit_time("fatal: not a git repository"), None);
    }

    #[tokio::test]
    async fn test_missing_file_has_no_mtime() {
        assert_eq!(fs_mtime(Path::new("/no/such/file.json")).await, None);
        assert_eq!(NoTimestamps.last_modified(Path::new("x.json")).await, None);
    }
}
