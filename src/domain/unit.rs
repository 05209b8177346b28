//! Content units: one parsed input file.
//!
//! A unit is an arbitrary JSON object. The only part this crate interprets is
//! the metadata block; everything else is opaque payload that the merger
//! either copies or drops.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Key of the metadata block in bundles and units
pub const METADATA_KEY: &str = "metadata";

/// Legacy homebrew key for the metadata block, accepted on input
pub const LEGACY_METADATA_KEY: &str = "_meta";

/// One parsed input file
#[derive(Debug, Clone)]
pub struct ContentUnit {
    /// File the unit was read from
    path: PathBuf,

    /// Parsed metadata block, if the file declared one
    metadata: Option<UnitMetadata>,

    /// All top-level fields except the metadata block, in file order
    fields: Map<String, Value>,
}

impl ContentUnit {
    /// Split a parsed JSON object into metadata and content fields
    pub fn from_object(path: impl Into<PathBuf>, mut object: Map<String, Value>) -> Self {
        // shift_remove keeps the remaining fields in file order
        let raw_meta = object.shift_remove(METADATA_KEY);
        let legacy_meta = object.shift_remove(LEGACY_METADATA_KEY);
        let raw_meta = raw_meta.or(legacy_meta);

        Self {
            path: path.into(),
            metadata: raw_meta.as_ref().and_then(UnitMetadata::from_value),
            fields: object,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> Option<&UnitMetadata> {
        self.metadata.as_ref()
    }

    /// Content fields in file order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Metadata declared by a single unit
///
/// Read leniently: values of the wrong shape are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitMetadata {
    pub sources: Vec<SourceDescriptor>,
    pub edition: Option<String>,
    pub date_added: Option<i64>,
    pub date_last_modified: Option<i64>,
}

impl UnitMetadata {
    /// Interpret a metadata block. Returns `None` when it is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let sources = object
            .get("sources")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(SourceDescriptor::from_value).collect())
            .unwrap_or_default();

        let edition = object
            .get("edition")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        Some(Self {
            sources,
            edition,
            date_added: object.get("dateAdded").and_then(as_timestamp),
            date_last_modified: object.get("dateLastModified").and_then(as_timestamp),
        })
    }
}

/// Read a unix-seconds timestamp from a JSON number
pub fn as_timestamp(value: &Value) -> Option<i64> {
    if let Some(ts) = value.as_i64() {
        return Some(ts);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .map(|f| f.floor() as i64)
}

/// A source entry from a metadata block, kept verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor(Map<String, Value>);

impl SourceDescriptor {
    /// Wrap a source entry. Non-object entries are not sources.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned().map(Self)
    }

    /// Identifier of the source: `id`, or the homebrew `json` field
    pub fn id(&self) -> Option<&str> {
        ["id", "json"]
            .iter()
            .filter_map(|key| self.0.get(*key).and_then(Value::as_str))
            .find(|id| !id.is_empty())
    }

    pub fn as_object(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl serde::Serialize for SourceDescriptor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_unit_splits_metadata_from_fields() {
        let unit = ContentUnit::from_object(
            "feats/a.json",
            object(json!({
                "feat": [{"name": "A"}],
                "metadata": {"edition": "2014"},
                "spell": []
            })),
        );

        assert_eq!(unit.metadata().unwrap().edition.as_deref(), Some("2014"));
        let keys: Vec<_> = unit.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["feat", "spell"]);
    }

    #[test]
    fn test_legacy_meta_key_is_accepted() {
        let unit = ContentUnit::from_object(
            "a.json",
            object(json!({"_meta": {"sources": [{"json": "X"}]}})),
        );

        let meta = unit.metadata().unwrap();
        assert_eq!(meta.sources.len(), 1);
        assert_eq!(meta.sources[0].id(), Some("X"));
        assert_eq!(unit.fields().count(), 0);
    }

    #[test]
    fn test_lenient_metadata() {
        let meta = UnitMetadata::from_value(&json!({
            "sources": "not-a-list",
            "edition": 5,
            "dateAdded": "yesterday",
            "dateLastModified": 1700000000.9
        }))
        .unwrap();

        assert!(meta.sources.is_empty());
        assert_eq!(meta.edition, None);
        assert_eq!(meta.date_added, None);
        assert_eq!(meta.date_last_modified, Some(1_700_000_000));
    }

    #[test]
    fn test_source_id_prefers_id_field() {
        let source = SourceDescriptor::from_value(&json!({"id": "A", "json": "B"})).unwrap();
        assert_eq!(source.id(), Some("A"));

        let source = SourceDescriptor::from_value(&json!({"id": "", "json": "B"})).unwrap();
        assert_eq!(source.id(), Some("B"));

        let source = SourceDescriptor::from_value(&json!({"full": "No id"})).unwrap();
        assert_eq!(source.id(), None);

        assert!(SourceDescriptor::from_value(&json!("X")).is_none());
    }
}
