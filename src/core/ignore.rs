//! Ignore rules for relaxed validation.
//!
//! A validator failure is downgraded to "ignored" when its diagnostic text
//! matches either a built-in rule (the homebrew source-enum false positive)
//! or one of the extra rules parsed from configuration.
//!
//! Extra rules come from a single string split on `;;` or `||`:
//!
//! ```text
//! /(homebrew|brew).*authori[sz]ed/i ;; unknown source || /^warn/y
//! ```
//!
//! A token shaped like `/<body>/<flags>` with flags drawn from `gimsuy` is a
//! regular expression. Anything else is a case-insensitive literal substring.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::error::{BuildError, BuildResult};

/// Token separators in the extra-pattern string
pub const SEPARATORS: [&str; 2] = [";;", "||"];

/// Flags accepted after a delimited pattern
const PATTERN_FLAGS: &str = "gimsuy";

/// One match rule
#[derive(Debug, Clone)]
pub enum IgnoreRule {
    /// Case-insensitive substring
    Literal { text: String, lowered: String },

    /// Regular expression compiled with its flags
    Pattern {
        source: String,
        flags: String,
        regex: Regex,
    },
}

impl IgnoreRule {
    /// Parse a single (already trimmed) token
    pub fn parse(token: &str) -> BuildResult<Self> {
        let Some((body, flags)) = split_delimited(token) else {
            return Ok(IgnoreRule::Literal {
                text: token.to_string(),
                lowered: token.to_lowercase(),
            });
        };

        // `y` (sticky) with a fresh regex only matches at the start
        let anchored;
        let pattern = if flags.contains('y') {
            anchored = format!(r"\A(?:{})", body);
            anchored.as_str()
        } else {
            body
        };

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build()
            .map_err(|source| BuildError::InvalidIgnorePattern {
                token: token.to_string(),
                source,
            })?;

        Ok(IgnoreRule::Pattern {
            source: body.to_string(),
            flags: flags.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            IgnoreRule::Literal { lowered, .. } => text.to_lowercase().contains(lowered.as_str()),
            IgnoreRule::Pattern { regex, .. } => regex.is_match(text),
        }
    }
}

impl std::fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnoreRule::Literal { text, .. } => write!(f, "'{}'", text),
            IgnoreRule::Pattern { source, flags, .. } => write!(f, "/{}/{}", source, flags),
        }
    }
}

/// Split `/<body>/<flags>` into its parts
fn split_delimited(token: &str) -> Option<(&str, &str)> {
    let inner = token.strip_prefix('/')?;
    let (body, flags) = inner.rsplit_once('/')?;
    if body.is_empty() || !flags.chars().all(|c| PATTERN_FLAGS.contains(c)) {
        return None;
    }
    Some((body, flags))
}

/// Split the configuration string into trimmed, non-empty tokens
pub fn split_tokens(config: &str) -> Vec<&str> {
    let mut tokens = vec![config];
    for sep in SEPARATORS {
        tokens = tokens.into_iter().flat_map(|t| t.split(sep)).collect();
    }
    tokens
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Built-in rules plus configured extras
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    extra: Vec<IgnoreRule>,
}

impl IgnoreRules {
    /// Parse the extra-pattern string. Invalid regexes fail here, not at match time.
    pub fn parse(config: &str) -> BuildResult<Self> {
        let extra = split_tokens(config)
            .into_iter()
            .map(IgnoreRule::parse)
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(Self { extra })
    }

    pub fn extra(&self) -> &[IgnoreRule] {
        &self.extra
    }

    /// Why a diagnostic may be ignored, or `None` if it may not
    pub fn reason(&self, diagnostic: &str) -> Option<String> {
        if let Some(builtin) = builtin_reason(diagnostic) {
            return Some(builtin.to_string());
        }
        self.extra
            .iter()
            .find(|rule| rule.is_match(diagnostic))
            .map(|rule| format!("matched extra pattern {}", rule))
    }
}

struct BuiltinPatterns {
    instance_path: Regex,
    schema_path: Regex,
    keyword: Regex,
    textual_path: Regex,
    textual_enum: Regex,
}

fn builtins() -> &'static BuiltinPatterns {
    static BUILTINS: OnceLock<BuiltinPatterns> = OnceLock::new();
    BUILTINS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("built-in ignore pattern compiles");
        BuiltinPatterns {
            instance_path: compile(r#""instancePath"\s*:\s*"/_meta/sources/\d+/json""#),
            schema_path: compile(
                r#""schemaPath"\s*:\s*"[^"]*sources-homebrew[^"]*/(sourcesColon|sourcesShort)/enum""#,
            ),
            keyword: compile(r#""keyword"\s*:\s*"enum""#),
            textual_path: compile(r"/_meta/sources/.*/json"),
            textual_enum: compile(r"\bsources(Short|Colon)/enum\b"),
        }
    })
}

/// Source-identifier enum failures on `_meta.sources[n].json`.
///
/// The validator only knows official source ids, so every homebrew source
/// trips this check.
fn builtin_reason(diagnostic: &str) -> Option<&'static str> {
    let b = builtins();

    if b.instance_path.is_match(diagnostic)
        && b.schema_path.is_match(diagnostic)
        && b.keyword.is_match(diagnostic)
    {
        return Some("source id enum check (structured diagnostic)");
    }

    if b.textual_path.is_match(diagnostic) && b.textual_enum.is_match(diagnostic) {
        return Some("source id enum check (text diagnostic)");
    }

    None
}
