//! Domain types for brewbundle.
//!
//! - Unit: one parsed input file and its metadata
//! - Bundle: the merged output and its reconciled metadata
//! - Outcome: validation modes and classifications

pub mod bundle;
pub mod outcome;
pub mod unit;

// Re-export commonly used types
pub use bundle::{Bundle, BundleMetadata, ContentKind, PreviousMetadata, DEFAULT_EDITION};
pub use outcome::{Artifact, ValidateMode, ValidationOutcome};
pub use unit::{ContentUnit, SourceDescriptor, UnitMetadata, LEGACY_METADATA_KEY, METADATA_KEY};
