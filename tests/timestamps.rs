//! Timestamp Source Integration Tests

use brewbundle::adapters::{GitTimestamps, MtimeTimestamps, NoTimestamps, TimestampOracle};
use filetime::FileTime;
use tempfile::TempDir;

const BACKDATED: i64 = 1_600_000_000;

fn backdated_file(temp_dir: &TempDir) -> std::path::PathBuf {
    let path = temp_dir.path().join("elf.json");
    std::fs::write(&path, "{}").unwrap();
    filetime::set_file_mtime(&path, FileTime::from_unix_time(BACKDATED, 0)).unwrap();
    path
}

#[tokio::test]
async fn test_mtime_source_reads_file_time() {
    let temp_dir = TempDir::new().unwrap();
    let path = backdated_file(&temp_dir);

    assert_eq!(MtimeTimestamps.last_modified(&path).await, Some(BACKDATED));
}

#[tokio::test]
async fn test_git_source_falls_back_to_mtime_for_untracked_files() {
    let temp_dir = TempDir::new().unwrap();
    let path = backdated_file(&temp_dir);

    assert_eq!(GitTimestamps.last_modified(&path).await, Some(BACKDATED));
}

#[tokio::test]
async fn test_missing_file_has_no_time() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("gone.json");

    assert_eq!(MtimeTimestamps.last_modified(&path).await, None);
    assert_eq!(GitTimestamps.last_modified(&path).await, None);
    assert_eq!(NoTimestamps.last_modified(&path).await, None);
}
