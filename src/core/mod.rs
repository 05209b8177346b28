//! Core bundling logic.
//!
//! This module contains:
//! - Discovery and Loader: finding and parsing content files
//! - Gate and Ignore: validation strictness and error suppression
//! - Reconcile and Merge: folding units into the bundle
//! - Writer: staging and persisting the bundle
//! - Builder: the pipeline tying them together

pub mod builder;
pub mod discovery;
pub mod gate;
pub mod ignore;
pub mod loader;
pub mod merge;
pub mod reconcile;
pub mod side_log;
pub mod writer;

// Re-export commonly used types
pub use builder::{BuildReport, BuildSettings, BundleAccumulator, BundleBuilder};
pub use discovery::{discover, discover_root};
pub use gate::ValidationGate;
pub use ignore::{IgnoreRule, IgnoreRules};
pub use loader::{load_unit, parse_unit};
pub use merge::{ContentMerger, MergeStats};
pub use reconcile::{load_previous_metadata, MetadataReconciler, SourceRegistry};
pub use side_log::SideLog;
pub use writer::{BundleWriter, StagedBundle};
