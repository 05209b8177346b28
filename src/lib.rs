//! brewbundle - Validating bundler for homebrew JSON content
//!
//! Collects JSON content files from a set of category directories, checks
//! each one with an external schema validator, concatenates their content
//! arrays and reconciles their metadata into a single bundle.
//!
//! # Pipeline
//!
//! - Discover `*.json` files per category root, sorted by name
//! - Load and validate each file (`full`, `relaxed` or `off`)
//! - Fold metadata (sources, edition, dates) and merge whitelisted arrays
//! - Finalize metadata against the previous bundle, validate the result,
//!   then move it into place
//!
//! # Modules
//!
//! - `adapters`: External tools (validator, git/mtime timestamps)
//! - `core`: Pipeline logic (Gate, Reconcile, Merge, Writer, Builder)
//! - `domain`: Data structures (ContentUnit, Bundle, ValidationOutcome)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Build with strict validation
//! brewbundle build
//!
//! # Tolerate known homebrew source errors plus an extra pattern
//! HOMEBREW_IGNORE_PATTERNS='/(homebrew|brew).*authori[sz]ed/i' brewbundle build --validate=relaxed
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;

// Re-export main types at crate root for convenience
pub use core::{BuildReport, BuildSettings, BundleBuilder};
pub use domain::{Bundle, BundleMetadata, ContentKind, ContentUnit, ValidateMode, ValidationOutcome};
pub use error::{BuildError, BuildResult};
