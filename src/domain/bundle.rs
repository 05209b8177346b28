//! The merged bundle and its metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::unit::{as_timestamp, SourceDescriptor, LEGACY_METADATA_KEY, METADATA_KEY};

/// Edition recorded when neither the inputs nor a previous bundle declare one
pub const DEFAULT_EDITION: &str = "2024";

/// Content-type tags that may appear as top-level bundle keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Race,
    Class,
    Subclass,
    Background,
    Feat,
    Item,
    Spell,
    OptionalFeature,
    Psionic,
    Monster,
    Vehicle,
    VariantRule,
    Table,
    Adventure,
    Book,
}

impl ContentKind {
    pub const ALL: [ContentKind; 15] = [
        ContentKind::Race,
        ContentKind::Class,
        ContentKind::Subclass,
        ContentKind::Background,
        ContentKind::Feat,
        ContentKind::Item,
        ContentKind::Spell,
        ContentKind::OptionalFeature,
        ContentKind::Psionic,
        ContentKind::Monster,
        ContentKind::Vehicle,
        ContentKind::VariantRule,
        ContentKind::Table,
        ContentKind::Adventure,
        ContentKind::Book,
    ];

    /// The top-level key used for this kind
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Race => "race",
            ContentKind::Class => "class",
            ContentKind::Subclass => "subclass",
            ContentKind::Background => "background",
            ContentKind::Feat => "feat",
            ContentKind::Item => "item",
            ContentKind::Spell => "spell",
            ContentKind::OptionalFeature => "optionalfeature",
            ContentKind::Psionic => "psionic",
            ContentKind::Monster => "monster",
            ContentKind::Vehicle => "vehicle",
            ContentKind::VariantRule => "variantrule",
            ContentKind::Table => "table",
            ContentKind::Adventure => "adventure",
            ContentKind::Book => "book",
        }
    }

    /// Look up a whitelisted key. Matching is exact.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == key)
    }

    /// Default category directory holding files of this kind
    pub fn default_root(self) -> String {
        match self {
            ContentKind::Class => "classes".to_string(),
            ContentKind::Subclass => "subclasses".to_string(),
            other => format!("{}s", other.as_str()),
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Reconciled metadata describing the whole bundle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetadata {
    pub sources: Vec<SourceDescriptor>,
    pub edition: String,
    pub date_added: i64,
    pub date_last_modified: i64,
}

/// The parts of an earlier bundle that carry over into a rebuild
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviousMetadata {
    pub edition: Option<String>,
    pub date_added: Option<i64>,
}

impl PreviousMetadata {
    /// Extract carry-over metadata from a parsed bundle.
    ///
    /// Looks under `meta_key` first, then under the two standard keys.
    pub fn from_bundle(bundle: &Value, meta_key: &str) -> Option<Self> {
        let meta = [meta_key, METADATA_KEY, LEGACY_METADATA_KEY]
            .iter()
            .find_map(|key| bundle.get(*key))
            .and_then(Value::as_object)?;

        Some(Self {
            edition: meta
                .get("edition")
                .and_then(Value::as_str)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            date_added: meta.get("dateAdded").and_then(as_timestamp),
        })
    }
}

/// The assembled output artifact
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub metadata: BundleMetadata,

    /// Merged records per content kind, keys in first-seen order
    pub content: Map<String, Value>,
}

impl Bundle {
    /// Render as JSON with the metadata block under `meta_key`, first
    pub fn to_value(&self, meta_key: &str) -> serde_json::Result<Value> {
        let mut out = Map::new();
        out.insert(meta_key.to_string(), serde_json::to_value(&self.metadata)?);
        for (key, records) in &self.content {
            out.insert(key.clone(), records.clone());
        }
        Ok(Value::Object(out))
    }

    /// Number of records merged for a kind
    pub fn record_count(&self, kind: ContentKind) -> usize {
        self.content
            .get(kind.as_str())
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_kind_keys() {
        assert_eq!(ContentKind::from_key("optionalfeature"), Some(ContentKind::OptionalFeature));
        assert_eq!(ContentKind::from_key("feat"), Some(ContentKind::Feat));
        assert_eq!(ContentKind::from_key("Feat"), None);
        assert_eq!(ContentKind::from_key("feats"), None);
        assert_eq!(ContentKind::from_key("homebrew"), None);
    }

    #[test]
    fn test_default_roots_are_plural() {
        assert_eq!(ContentKind::Class.default_root(), "classes");
        assert_eq!(ContentKind::Subclass.default_root(), "subclasses");
        assert_eq!(ContentKind::Spell.default_root(), "spells");
        assert_eq!(ContentKind::VariantRule.default_root(), "variantrules");
    }

    #[test]
    fn test_metadata_serializes_camel_case_in_order() {
        let meta = BundleMetadata {
            sources: vec![],
            edition: "2024".to_string(),
            date_added: 1,
            date_last_modified: 2,
        };

        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(
            json,
            r#"{"sources":[],"edition":"2024","dateAdded":1,"dateLastModified":2}"#
        );
    }

    #[test]
    fn test_bundle_puts_metadata_first() {
        let mut content = Map::new();
        content.insert("spell".to_string(), json!([{"name": "S"}]));
        content.insert("feat".to_string(), json!([]));

        let bundle = Bundle {
            metadata: BundleMetadata {
                sources: vec![],
                edition: "2024".to_string(),
                date_added: 1,
                date_last_modified: 2,
            },
            content,
        };

        let value = bundle.to_value("_meta").unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["_meta", "spell", "feat"]);
        assert_eq!(bundle.record_count(ContentKind::Spell), 1);
        assert_eq!(bundle.record_count(ContentKind::Item), 0);
    }

    #[test]
    fn test_previous_metadata_from_bundle() {
        let bundle = json!({"metadata": {"edition": "classic", "dateAdded": 42}});
        let previous = PreviousMetadata::from_bundle(&bundle, "metadata").unwrap();
        assert_eq!(previous.edition.as_deref(), Some("classic"));
        assert_eq!(previous.date_added, Some(42));

        let legacy = json!({"_meta": {"dateAdded": "soon"}});
        let previous = PreviousMetadata::from_bundle(&legacy, "metadata").unwrap();
        assert_eq!(previous, PreviousMetadata::default());

        assert!(PreviousMetadata::from_bundle(&json!({"feat": []}), "metadata").is_none());
    }
}
