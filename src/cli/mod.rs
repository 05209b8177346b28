//! Command-line interface for brewbundle.
//!
//! Provides commands for building the bundle and inspecting the resolved
//! configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{load_config, ConfigOverrides, ResolvedConfig, TimestampSource};
use crate::core::{BuildReport, BundleBuilder, IgnoreRules};
use crate::domain::ValidateMode;
use crate::error::BuildError;

/// brewbundle - Validating bundler for homebrew JSON content
#[derive(Parser, Debug)]
#[command(name = "brewbundle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project directory (searched upward for .brewbundle/config.yaml)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub project: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate and merge all content files into one bundle
    Build {
        #[command(flatten)]
        options: BuildOptions,
    },

    /// Show resolved configuration (debug)
    Config {
        #[command(flatten)]
        options: BuildOptions,
    },
}

/// Options shared by commands that resolve a build configuration
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildOptions {
    /// Validation strictness
    #[arg(long, value_enum, env = "BREWBUNDLE_VALIDATE")]
    pub validate: Option<ModeArg>,

    /// Extra ignore patterns for relaxed mode, separated by ";;" or "||"
    #[arg(long, env = "HOMEBREW_IGNORE_PATTERNS")]
    pub ignore_patterns: Option<String>,

    /// Bundle output path
    #[arg(short, long, env = "BREWBUNDLE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Content root directory (repeatable, replaces the default list)
    #[arg(long = "root")]
    pub roots: Vec<String>,

    /// Side log for validator diagnostics
    #[arg(long, env = "BREWBUNDLE_SIDE_LOG")]
    pub side_log: Option<PathBuf>,

    /// Do not write a side log
    #[arg(long, conflicts_with = "side_log")]
    pub no_side_log: bool,

    /// Path to the test-json-brew validator
    #[arg(long, env = "BREWBUNDLE_VALIDATOR")]
    pub validator: Option<PathBuf>,

    /// Source of per-file last-modified times
    #[arg(long, value_enum)]
    pub timestamps: Option<TimestampArg>,

    /// Key for the bundle metadata block
    #[arg(long)]
    pub meta_key: Option<String>,
}

/// Validation mode for CLI (maps to ValidateMode)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Every validator failure aborts the build
    Full,

    /// Known-safe failures are logged and skipped
    Relaxed,

    /// Skip validation
    Off,
}

impl From<ModeArg> for ValidateMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Full => ValidateMode::Full,
            ModeArg::Relaxed => ValidateMode::Relaxed,
            ModeArg::Off => ValidateMode::Off,
        }
    }
}

/// Timestamp source for CLI (maps to TimestampSource)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TimestampArg {
    /// Last git commit, then filesystem mtime
    Git,

    /// Filesystem mtime
    Mtime,

    /// No per-file times
    #[value(name = "none")]
    Disabled,
}

impl From<TimestampArg> for TimestampSource {
    fn from(t: TimestampArg) -> Self {
        match t {
            TimestampArg::Git => TimestampSource::Git,
            TimestampArg::Mtime => TimestampSource::Mtime,
            TimestampArg::Disabled => TimestampSource::Disabled,
        }
    }
}

impl BuildOptions {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            roots: self.roots.clone(),
            output: self.output.clone(),
            side_log: self.side_log.clone(),
            no_side_log: self.no_side_log,
            validate_mode: self.validate.map(Into::into),
            ignore_patterns: self.ignore_patterns.clone(),
            validator: self.validator.clone(),
            timestamps: self.timestamps.map(Into::into),
            meta_key: self.meta_key.clone(),
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Build { options } => {
                let config = load_config(&self.project, &options.overrides())?;
                build_bundle(&config).await
            }
            Commands::Config { options } => {
                let config = load_config(&self.project, &options.overrides())?;
                show_config(&config)
            }
        }
    }
}

/// Run a build and print its summary
async fn build_bundle(config: &ResolvedConfig) -> Result<()> {
    let builder = BundleBuilder::new(
        config.build_settings(),
        config.validator_oracle(),
        config.timestamp_oracle(),
    );

    match builder.build().await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            // The validator's own output goes to stderr before we exit
            if let Some(diagnostic) = e.diagnostic() {
                eprintln!("{}", diagnostic);
            }
            if let (BuildError::ValidationFailure { .. }, Some(side_log)) = (&e, &config.side_log) {
                eprintln!("[details appended to {}]", side_log.display());
            }
            Err(e).context("Bundle build failed")
        }
    }
}

fn print_report(report: &BuildReport) {
    let meta = &report.metadata;
    println!("Bundle written to: {}", report.output.display());
    println!(
        "   metadata: edition={}, dateAdded={} ({}), dateLastModified={} ({})",
        meta.edition,
        meta.date_added,
        format_timestamp(meta.date_added),
        meta.date_last_modified,
        format_timestamp(meta.date_last_modified),
    );
    println!(
        "   {} file(s) merged, {} with ignored validation errors, {} source(s)",
        report.files_merged,
        report.files_ignored,
        meta.sources.len()
    );
    for (kind, count) in &report.record_counts {
        println!("   {:<16} {}", kind, count);
    }
}

fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "out of range".to_string())
}

/// Show resolved configuration
fn show_config(config: &ResolvedConfig) -> Result<()> {
    // Parse the patterns so a bad configuration shows up here too
    let rules = IgnoreRules::parse(&config.ignore_patterns)?;

    println!("brewbundle configuration");
    println!("========================");
    println!();
    if let Some(ref path) = config.config_file {
        println!("Config file:   {}", path.display());
    } else {
        println!("Config file:   (none found, using defaults)");
    }
    println!("Project:       {}", config.project_dir.display());
    println!("Output:        {}", config.output.display());
    println!("Validate:      {}", config.validate_mode);
    println!("Validator:     {}", config.validator.display());
    println!(
        "Side log:      {}",
        config
            .side_log
            .as_ref()
            .map_or_else(|| "(disabled)".to_string(), |p| p.display().to_string())
    );
    println!("Timestamps:    {:?}", config.timestamps);
    println!("Metadata key:  {}", config.meta_key);
    println!();
    println!("Content roots:");
    for root in &config.roots {
        let dir = config.project_dir.join(root);
        let marker = if dir.is_dir() { "" } else { " (missing)" };
        println!("  {}{}", root, marker);
    }
    if !rules.extra().is_empty() {
        println!();
        println!("Extra ignore patterns:");
        for rule in rules.extra() {
            println!("  {}", rule);
        }
    }

    Ok(())
}
