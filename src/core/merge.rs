//! Content merging across units.

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{ContentKind, ContentUnit};

/// Per-unit merge counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Records appended to the bundle
    pub records: usize,

    /// Fields skipped: unknown keys or non-array values
    pub skipped_fields: usize,
}

/// Concatenates whitelisted array fields, in the order units are merged
#[derive(Debug, Clone, Default)]
pub struct ContentMerger {
    content: Map<String, Value>,
}

impl ContentMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_unit(&mut self, unit: &ContentUnit) -> MergeStats {
        let mut stats = MergeStats::default();

        for (key, value) in unit.fields() {
            let (Some(kind), Some(records)) = (ContentKind::from_key(key), value.as_array()) else {
                debug!(file = %unit.path().display(), field = key, "skipping non-content field");
                stats.skipped_fields += 1;
                continue;
            };

            let slot = self
                .content
                .entry(kind.as_str())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(existing) = slot {
                existing.extend(records.iter().cloned());
                stats.records += records.len();
            }
        }

        stats
    }

    /// Merged content so far, keys in first-seen order
    pub fn content(&self) -> &Map<String, Value> {
        &self.content
    }

    pub fn into_content(self) -> Map<String, Value> {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unit(value: Value) -> ContentUnit {
        ContentUnit::from_object("u.json", value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_concatenates_in_merge_order() {
        let mut merger = ContentMerger::new();
        merger.merge_unit(&unit(json!({"feat": ["A"], "spell": ["S1"]})));
        merger.merge_unit(&unit(json!({"spell": ["S2", "S3"], "feat": ["B"]})));

        let content = merger.into_content();
        assert_eq!(content["feat"], json!(["A", "B"]));
        assert_eq!(content["spell"], json!(["S1", "S2", "S3"]));
        let keys: Vec<_> = content.keys().cloned().collect();
        assert_eq!(keys, vec!["feat", "spell"]);
    }

    #[test]
    fn test_unknown_and_non_array_fields_are_dropped() {
        let mut merger = ContentMerger::new();
        let stats = merger.merge_unit(&unit(json!({
            "feat": ["A"],
            "homebrewExtra": ["X"],
            "spell": {"name": "not a list"},
            "_meta": {"sources": []}
        })));

        assert_eq!(stats, MergeStats { records: 1, skipped_fields: 2 });
        let keys: Vec<_> = merger.content().keys().cloned().collect();
        assert_eq!(keys, vec!["feat"]);
    }

    #[test]
    fn test_empty_array_creates_key() {
        let mut merger = ContentMerger::new();
        merger.merge_unit(&unit(json!({"item": []})));
        assert_eq!(merger.content()["item"], json!([]));
    }
}
