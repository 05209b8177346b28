//! Bundle metadata reconciliation.
//!
//! Per-unit metadata is folded into running state as files are processed,
//! then finalized once against the previous bundle (if any):
//!
//! - `edition`: first declared, else previous bundle's, else `"2024"`
//! - `dateAdded`: previous bundle's (stable across rebuilds), else the
//!   smallest seen, else now
//! - `dateLastModified`: the largest seen if positive, else now

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::domain::{
    BundleMetadata, PreviousMetadata, SourceDescriptor, UnitMetadata, DEFAULT_EDITION,
};

/// Ordered, de-duplicated source list. First occurrence of an id wins.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    /// Append sources whose id is not registered yet. Returns how many were added.
    pub fn add_sources<'a>(&mut self, list: impl IntoIterator<Item = &'a SourceDescriptor>) -> usize {
        let mut added = 0;
        for source in list {
            let Some(id) = source.id() else {
                continue;
            };
            if self.contains(id) {
                debug!(source = id, "dropping duplicate source");
                continue;
            }
            self.sources.push(source.clone());
            added += 1;
        }
        added
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sources.iter().any(|s| s.id() == Some(id))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn into_vec(self) -> Vec<SourceDescriptor> {
        self.sources
    }
}

/// Running metadata state for one build
#[derive(Debug, Clone, Default)]
pub struct MetadataReconciler {
    sources: SourceRegistry,
    detected_edition: Option<String>,
    min_date_added: Option<i64>,
    max_last_modified: Option<i64>,
}

impl MetadataReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sources<'a>(&mut self, list: impl IntoIterator<Item = &'a SourceDescriptor>) -> usize {
        self.sources.add_sources(list)
    }

    /// Fold one unit's metadata block: sources, edition and both dates
    pub fn fold_unit_metadata(&mut self, meta: &UnitMetadata) {
        self.add_sources(&meta.sources);

        if self.detected_edition.is_none() {
            if let Some(edition) = &meta.edition {
                self.detected_edition = Some(edition.clone());
            }
        }

        if let Some(added) = meta.date_added {
            self.fold_min(added);
        }
        if let Some(modified) = meta.date_last_modified {
            self.fold_max(modified);
        }
    }

    /// Fold a file's externally known last-modified time.
    ///
    /// Also seeds `dateAdded` when no unit has declared one yet.
    pub fn fold_external_timestamp(&mut self, ts: i64) {
        self.fold_max(ts);
        if self.min_date_added.is_none() {
            self.min_date_added = Some(ts);
        }
    }

    fn fold_min(&mut self, ts: i64) {
        self.min_date_added = Some(self.min_date_added.map_or(ts, |m| m.min(ts)));
    }

    fn fold_max(&mut self, ts: i64) {
        self.max_last_modified = Some(self.max_last_modified.map_or(ts, |m| m.max(ts)));
    }

    pub fn detected_edition(&self) -> Option<&str> {
        self.detected_edition.as_deref()
    }

    /// Produce the bundle metadata. `now` is the build's wall-clock time.
    pub fn finalize(self, previous: Option<&PreviousMetadata>, now: i64) -> BundleMetadata {
        let edition = self
            .detected_edition
            .or_else(|| previous.and_then(|p| p.edition.clone()))
            .unwrap_or_else(|| DEFAULT_EDITION.to_string());

        let date_added = previous
            .and_then(|p| p.date_added)
            .or(self.min_date_added)
            .unwrap_or(now);

        let date_last_modified = self
            .max_last_modified
            .filter(|ts| *ts > 0)
            .unwrap_or(now);

        BundleMetadata {
            sources: self.sources.into_vec(),
            edition,
            date_added,
            date_last_modified,
        }
    }
}

/// Read carry-over metadata from a previously written bundle.
///
/// Any problem reading or parsing the file means there is no previous bundle.
pub async fn load_previous_metadata(output: &Path, meta_key: &str) -> Option<PreviousMetadata> {
    let text = tokio::fs::read_to_string(output).await.ok()?;
    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            debug!(bundle = %output.display(), error = %e, "ignoring unreadable previous bundle");
            return None;
        }
    };
    PreviousMetadata::from_bundle(&value, meta_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(value: Value) -> SourceDescriptor {
        SourceDescriptor::from_value(&value).unwrap()
    }

    fn meta(value: Value) -> UnitMetadata {
        UnitMetadata::from_value(&value).unwrap()
    }

    #[test]
    fn test_first_source_wins() {
        let mut registry = SourceRegistry::default();
        let first = source(json!({"id": "X", "full": "First"}));
        let second = source(json!({"id": "X", "full": "Second"}));
        let other = source(json!({"id": "Y"}));
        let anonymous = source(json!({"full": "No id"}));

        assert_eq!(registry.add_sources([&first, &anonymous]), 1);
        assert_eq!(registry.add_sources([&second, &other]), 1);

        let sources = registry.into_vec();
        assert_eq!(sources, vec![first, other]);
    }

    #[test]
    fn test_first_edition_wins() {
        let mut reconciler = MetadataReconciler::new();
        reconciler.fold_unit_metadata(&meta(json!({})));
        reconciler.fold_unit_metadata(&meta(json!({"edition": "classic"})));
        reconciler.fold_unit_metadata(&meta(json!({"edition": "2024"})));

        assert_eq!(reconciler.detected_edition(), Some("classic"));
        let finalized = reconciler.finalize(None, 1_000);
        assert_eq!(finalized.edition, "classic");
    }

    #[test]
    fn test_defaults_with_no_signal() {
        let finalized = MetadataReconciler::new().finalize(None, 1_000);
        assert_eq!(finalized.edition, DEFAULT_EDITION);
        assert_eq!(finalized.date_added, 1_000);
        assert_eq!(finalized.date_last_modified, 1_000);
        assert!(finalized.sources.is_empty());
    }

    #[test]
    fn test_min_and_max_dates() {
        let mut reconciler = MetadataReconciler::new();
        reconciler.fold_unit_metadata(&meta(json!({"dateAdded": 100, "dateLastModified": 200})));
        reconciler.fold_unit_metadata(&meta(json!({"dateAdded": 50, "dateLastModified": 300})));
        reconciler.fold_unit_metadata(&meta(json!({"dateAdded": 75, "dateLastModified": 250})));

        let finalized = reconciler.finalize(None, 1_000);
        assert_eq!(finalized.date_added, 50);
        assert_eq!(finalized.date_last_modified, 300);
    }

    #[test]
    fn test_external_timestamp_seeds_date_added_once() {
        let mut reconciler = MetadataReconciler::new();
        reconciler.fold_external_timestamp(500);
        reconciler.fold_external_timestamp(400);

        let finalized = reconciler.finalize(None, 1_000);
        assert_eq!(finalized.date_added, 500);
        assert_eq!(finalized.date_last_modified, 500);
    }

    #[test]
    fn test_declared_date_added_beats_later_seed() {
        let mut reconciler = MetadataReconciler::new();
        reconciler.fold_external_timestamp(500);
        reconciler.fold_unit_metadata(&meta(json!({"dateAdded": 700})));

        // 500 was seeded first and is smaller
        assert_eq!(reconciler.finalize(None, 1_000).date_added, 500);
    }

    #[test]
    fn test_previous_bundle_is_authoritative_for_date_added() {
        let mut reconciler = MetadataReconciler::new();
        reconciler.fold_unit_metadata(&meta(json!({"dateAdded": 10, "dateLastModified": 20})));

        let previous = PreviousMetadata {
            edition: Some("classic".to_string()),
            date_added: Some(5_000),
        };
        let finalized = reconciler.finalize(Some(&previous), 9_000);
        assert_eq!(finalized.date_added, 5_000);
        assert_eq!(finalized.edition, "classic");
        assert_eq!(finalized.date_last_modified, 20);
    }

    #[test]
    fn test_non_positive_last_modified_falls_back_to_now() {
        let mut reconciler = MetadataReconciler::new();
        reconciler.fold_unit_metadata(&meta(json!({"dateLastModified": 0})));
        assert_eq!(reconciler.finalize(None, 1_000).date_last_modified, 1_000);
    }

    #[tokio::test]
    async fn test_load_previous_metadata() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("bundle.json");
        assert!(load_previous_metadata(&path, "metadata").await.is_none());

        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(load_previous_metadata(&path, "metadata").await.is_none());

        tokio::fs::write(&path, r#"{"metadata": {"dateAdded": 77}}"#)
            .await
            .unwrap();
        let previous = load_previous_metadata(&path, "metadata").await.unwrap();
        assert_eq!(previous.date_added, Some(77));
        assert_eq!(previous.edition, None);
    }
}
