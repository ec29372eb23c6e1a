//! Synthesis engine
//!
//! Owns the mapped voice database, the configuration, and the lazily
//! compiled rewrite ruleset, and drives one-shot synthesis calls over them.

pub mod concat;
pub mod config;
pub mod prosody;
pub mod selector;

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::audio::stretch;
use crate::core::error::Result;
use crate::db::VoiceDb;
use crate::text::{normalizer, RewriteRules};
use concat::Concatenator;
use prosody::ProsodyContext;

pub use config::EngineConfig;

/// Default rewrite ruleset location, resolved against the working directory
const DEFAULT_RULES_PATH: &str = "normalization.csv";

/// A loaded voice ready to synthesize
///
/// One engine instance serves one call at a time; synthesis takes `&mut
/// self` because it updates the per-call counters and may compile the
/// rewrite ruleset on first use. The database mapping is released on drop.
pub struct Engine {
    db: VoiceDb,
    config: EngineConfig,
    rules: Option<RewriteRules>,
    rules_path: PathBuf,
    units_found: u32,
    units_missing: u32,
}

impl Engine {
    /// Open a compiled voice database
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db = VoiceDb::open(db_path)?;
        info!(units = db.unit_count(), "voice database loaded");
        Ok(Engine {
            db,
            config: EngineConfig::default(),
            rules: None,
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            units_found: 0,
            units_missing: 0,
        })
    }

    /// Replace the configuration with one loaded from `path`
    ///
    /// A missing file leaves the defaults in place.
    pub fn load_config(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.config = EngineConfig::load(path)?;
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    /// Point the engine at a different rewrite ruleset file
    ///
    /// Discards any already-compiled rules; the next synthesis call reloads.
    pub fn set_rules_path(&mut self, path: impl Into<PathBuf>) {
        self.rules_path = path.into();
        self.rules = None;
    }

    /// The mapped database
    pub fn db(&self) -> &VoiceDb {
        &self.db
    }

    /// Units matched by the most recent synthesis call
    pub fn units_found(&self) -> u32 {
        self.units_found
    }

    /// Characters the most recent call replaced with silence
    pub fn units_missing(&self) -> u32 {
        self.units_missing
    }

    /// Synthesize one input string into mono 16-bit PCM at 22 050 Hz
    ///
    /// `speed` is clamped to the configured range; 1.0 bypasses the time
    /// stretcher entirely.
    pub fn synthesize(&mut self, text: &str, speed: f32) -> Result<Vec<i16>> {
        let started = Instant::now();

        if self.rules.is_none() {
            let rules = RewriteRules::load(&self.rules_path)?;
            if !rules.is_empty() {
                info!(count = rules.len(), "loaded rewrite rules");
            }
            self.rules = Some(rules);
        }

        let context = ProsodyContext::scan(text);
        let expanded = normalizer::expand_numbers(text);
        let rewritten = match &self.rules {
            Some(rules) => rules.apply(&expanded),
            None => expanded,
        };
        let normalized = normalizer::lowercase(&rewritten);

        let mut found = 0u32;
        let mut missing = 0u32;
        let mut concat = Concatenator::new(self.config.clone(), context);

        let mut pos = 0;
        while pos < normalized.len() {
            let rest = &normalized[pos..];
            let Some(c) = rest.chars().next() else {
                break;
            };

            if c.is_whitespace() {
                concat.word_break();
                pos += c.len_utf8();
                continue;
            }
            if selector::is_pause_punctuation(c) {
                concat.punctuation_break(c);
                pos += c.len_utf8();
                continue;
            }
            if c == '-' || selector::is_ignorable(c) {
                pos += c.len_utf8();
                continue;
            }

            match selector::select(&self.db, rest, concat.at_word_start()) {
                Some(selection) => {
                    let entry = self.db.entry(selection.unit_index);
                    let unit_text = self.db.unit_text(&entry);
                    if self.config.print_units {
                        info!(unit = unit_text, "matched");
                    }
                    let samples = self.db.unit_samples(&entry);
                    concat.push_unit(unit_text, &samples);
                    found += 1;
                    pos += selection.byte_len;
                }
                None => {
                    debug!(character = %c, "no unit, inserting silence");
                    concat.push_unknown();
                    missing += 1;
                    pos += c.len_utf8();
                }
            }
        }

        let mut samples = concat.finish();

        let speed = speed.clamp(self.config.min_speed, self.config.max_speed);
        if speed != 1.0 {
            samples = stretch::stretch(&samples, speed);
        }

        self.units_found = found;
        self.units_missing = missing;
        if self.config.print_timing {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                samples = samples.len(),
                "synthesis finished"
            );
        }
        Ok(samples)
    }
}
