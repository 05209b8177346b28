//! Configuration for brewbundle builds.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags and environment variables (BREWBUNDLE_VALIDATE,
//!    HOMEBREW_IGNORE_PATTERNS, BREWBUNDLE_OUTPUT, ...), merged by the CLI
//! 2. Config file (.brewbundle/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches the start directory and its parents for .brewbundle/config.yaml
//! - The directory containing .brewbundle/ becomes the project directory
//! - Relative paths in the config file resolve against the project directory

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::{
    validator::default_binary, BrewValidator, GitTimestamps, MtimeTimestamps, NoTimestamps,
    TimestampOracle, ValidatorOracle,
};
use crate::core::{BuildSettings, SideLog};
use crate::domain::{ContentKind, ValidateMode, METADATA_KEY};

/// Bundle path relative to the project directory
pub const DEFAULT_OUTPUT: &str = "dist/homebrew-bundle.json";

/// Config directory name searched for in the project and its parents
pub const CONFIG_DIR: &str = ".brewbundle";

/// Category directories, one per content kind, in merge order
pub fn default_roots() -> Vec<String> {
    ContentKind::ALL.iter().map(|kind| kind.default_root()).collect()
}

/// Where per-file last-modified times come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    /// Last commit touching the file, then filesystem mtime
    #[default]
    Git,

    /// Filesystem mtime only
    Mtime,

    /// No per-file times
    #[serde(rename = "none")]
    Disabled,
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub validation: Option<ValidationConfig>,
    #[serde(default)]
    pub bundle: Option<BundleConfig>,
}

fn default_version() -> String {
    "1".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Category roots, in merge order
    pub roots: Option<Vec<String>>,
    /// Bundle output path
    pub output: Option<String>,
    /// Side log for validator diagnostics
    pub side_log: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    pub mode: Option<ValidateMode>,
    pub ignore_patterns: Option<String>,
    /// Path to the validator binary
    pub validator: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BundleConfig {
    /// Key for the metadata block (e.g. `_meta` for legacy homebrew)
    pub meta_key: Option<String>,
    pub timestamps: Option<TimestampSource>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub roots: Vec<String>,
    pub output: Option<PathBuf>,
    pub side_log: Option<PathBuf>,
    pub no_side_log: bool,
    pub validate_mode: Option<ValidateMode>,
    pub ignore_patterns: Option<String>,
    pub validator: Option<PathBuf>,
    pub timestamps: Option<TimestampSource>,
    pub meta_key: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Directory holding the category roots
    pub project_dir: PathBuf,
    /// Category roots, in merge order
    pub roots: Vec<String>,
    /// Bundle output path
    pub output: PathBuf,
    /// Side log path (None when disabled)
    pub side_log: Option<PathBuf>,
    pub validate_mode: ValidateMode,
    pub ignore_patterns: String,
    /// Validator binary
    pub validator: PathBuf,
    pub timestamps: TimestampSource,
    pub meta_key: String,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Settings for one build
    pub fn build_settings(&self) -> BuildSettings {
        BuildSettings {
            project_dir: self.project_dir.clone(),
            roots: self.roots.clone(),
            output: self.output.clone(),
            validate_mode: self.validate_mode,
            ignore_patterns: self.ignore_patterns.clone(),
            side_log: self.side_log.clone(),
            meta_key: self.meta_key.clone(),
        }
    }

    pub fn validator_oracle(&self) -> Arc<dyn ValidatorOracle> {
        Arc::new(BrewValidator::with_binary_path(&self.validator))
    }

    pub fn timestamp_oracle(&self) -> Arc<dyn TimestampOracle> {
        match self.timestamps {
            TimestampSource::Git => Arc::new(GitTimestamps),
            TimestampSource::Mtime => Arc::new(MtimeTimestamps),
            TimestampSource::Disabled => Arc::new(NoTimestamps),
        }
    }
}

/// Find config file by searching `start` and its parents
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Load configuration from all sources, starting the file search at `start`
pub fn load_config(start: &Path, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to determine current directory")?
            .join(start)
    };

    let config_file = find_config_file(&start);
    let file = match &config_file {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };

    // Project root is the parent of .brewbundle/
    let project_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or(start);

    let paths = file.as_ref().map(|f| f.paths.clone()).unwrap_or_default();
    let validation = file.as_ref().and_then(|f| f.validation.clone());
    let bundle = file.as_ref().and_then(|f| f.bundle.clone());

    let roots = if !overrides.roots.is_empty() {
        overrides.roots.clone()
    } else {
        paths.roots.unwrap_or_else(default_roots)
    };

    let output = overrides
        .output
        .clone()
        .or_else(|| paths.output.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let side_log = if overrides.no_side_log {
        None
    } else {
        Some(
            overrides
                .side_log
                .clone()
                .or_else(|| paths.side_log.map(PathBuf::from))
                .map(|p| resolve_path(&project_dir, &p))
                .unwrap_or_else(SideLog::default_path),
        )
    };

    let validate_mode = overrides
        .validate_mode
        .or_else(|| validation.as_ref().and_then(|v| v.mode))
        .unwrap_or_default();

    let ignore_patterns = overrides
        .ignore_patterns
        .clone()
        .or_else(|| validation.as_ref().and_then(|v| v.ignore_patterns.clone()))
        .unwrap_or_default();

    let validator = overrides
        .validator
        .clone()
        .or_else(|| {
            validation
                .as_ref()
                .and_then(|v| v.validator.as_ref().map(PathBuf::from))
        })
        .map(|p| resolve_path(&project_dir, &p))
        .unwrap_or_else(|| default_binary(&project_dir));

    let timestamps = overrides
        .timestamps
        .or_else(|| bundle.as_ref().and_then(|b| b.timestamps))
        .unwrap_or_default();

    let meta_key = overrides
        .meta_key
        .clone()
        .or_else(|| bundle.as_ref().and_then(|b| b.meta_key.clone()))
        .unwrap_or_else(|| METADATA_KEY.to_string());

    Ok(ResolvedConfig {
        output: resolve_path(&project_dir, &output),
        project_dir,
        roots,
        side_log,
        validate_mode,
        ignore_patterns,
        validator,
        timestamps,
        meta_key,
        config_file,
    })
}
