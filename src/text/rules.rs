//! Rewrite ruleset loaded from CSV
//!
//! Each line is `pattern,replacement`; `#` starts a comment. Patterns are
//! regular expressions (word boundaries via `\b` work as-is); replacements
//! may reference capture groups with `\0`..`\9`. Rules apply in file order,
//! each pass rewriting the whole buffer. A rule whose pattern fails to
//! compile is skipped with a diagnostic.

use std::path::Path;

use regex::Regex;
use tracing::warn;

use crate::core::error::{Result, TtsError};

struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

/// Ordered, compiled rewrite rules
pub struct RewriteRules {
    rules: Vec<RewriteRule>,
}

impl RewriteRules {
    /// Ruleset with no rules; `apply` is the identity
    pub fn empty() -> Self {
        RewriteRules { rules: Vec::new() }
    }

    /// Load rules from a CSV file; a missing file yields an empty ruleset
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(err) => {
                return Err(TtsError::FileRead {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        };
        Ok(Self::parse(&content))
    }

    /// Parse rules from CSV text
    pub fn parse(content: &str) -> Self {
        let mut rules = Vec::new();
        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((pattern, replacement)) = line.split_once(',') else {
                continue;
            };
            match Regex::new(pattern) {
                Ok(compiled) => rules.push(RewriteRule {
                    pattern: compiled,
                    replacement: convert_replacement(replacement),
                }),
                Err(err) => warn!("skipping rewrite rule with invalid pattern '{pattern}': {err}"),
            }
        }
        RewriteRules { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule over `text` in order
    pub fn apply(&self, text: &str) -> String {
        let mut current = text.to_string();
        for rule in &self.rules {
            current = rule
                .pattern
                .replace_all(&current, rule.replacement.as_str())
                .into_owned();
        }
        current
    }
}

/// Translate `\0`..`\9` backreferences to `${n}` capture syntax and escape
/// literal `$`
fn convert_replacement(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&d) if d.is_ascii_digit() => {
                    chars.next();
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                }
                _ => out.push(c),
            },
            '$' => out.push_str("$$"),
            _ => out.push(c),
        }
    }
    out
}
