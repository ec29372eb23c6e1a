//! Engine configuration
//!
//! Every tunable of the synthesis pipeline with its default, plus the
//! line-oriented `key: value` config file loader. Section headers in the
//! file are decorative; keys are matched globally and unknown keys are
//! ignored. A missing config file leaves the defaults in place.

use std::path::Path;

use crate::core::error::{Result, TtsError};

/// All configuration parameters of a synthesis engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Baseline crossfade between intra-word units, ms
    pub crossfade_ms: f32,
    /// Crossfade when both neighbouring units are vowel-bordered, ms
    pub crossfade_vowel_ms: f32,
    /// Cap when the previous unit ends in a sibilant `s`, ms
    pub crossfade_s_ending_ms: f32,
    /// Cap when the previous unit ends in a rhotic `r`, ms
    pub crossfade_r_ending_ms: f32,
    /// Multiplier for vowel-to-consonant transitions
    pub vowel_to_consonant_factor: f32,
    /// Silence inserted at whitespace, ms
    pub word_pause_ms: f32,
    /// Silence substituted for an unmapped character, ms
    pub unknown_silence_ms: f32,
    /// Ramp applied at the start of each word, ms
    pub fade_in_ms: f32,
    /// Ramp applied before pauses and at utterance end, ms
    pub fade_out_ms: f32,
    /// Trim silence inside words
    pub remove_word_silence: bool,
    /// Silence threshold as a fraction of the word's peak
    pub silence_threshold: f32,
    /// Shortest silent run worth trimming, ms
    pub min_silence_ms: f32,
    /// Remove DC offset from every unit before mixing
    pub remove_dc_offset: bool,
    /// Stretch factor used when the caller passes none
    pub default_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Log every matched unit
    pub print_units: bool,
    /// Log per-call synthesis timing
    pub print_timing: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            crossfade_ms: 20.0,
            crossfade_vowel_ms: 45.0,
            crossfade_s_ending_ms: 30.0,
            crossfade_r_ending_ms: 30.0,
            vowel_to_consonant_factor: 0.5,
            word_pause_ms: 120.0,
            unknown_silence_ms: 30.0,
            fade_in_ms: 3.0,
            fade_out_ms: 3.0,
            remove_word_silence: true,
            silence_threshold: 0.02,
            min_silence_ms: 15.0,
            remove_dc_offset: true,
            default_speed: 1.0,
            min_speed: 0.5,
            max_speed: 2.0,
            print_units: false,
            print_timing: false,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by a `key: value` file; a missing file is fine
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = EngineConfig::default();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(config),
            Err(err) => {
                return Err(TtsError::FileRead {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        };
        for line in content.lines() {
            config.apply_line(line);
        }
        Ok(config)
    }

    fn apply_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        let Some((key, value)) = line.split_once(':') else {
            return;
        };
        let key = key.trim();
        let value = value.trim();

        let set_f32 = |target: &mut f32| {
            if let Ok(parsed) = value.parse::<f32>() {
                *target = parsed;
            }
        };

        match key {
            "crossfade_ms" => set_f32(&mut self.crossfade_ms),
            "crossfade_vowel_ms" => set_f32(&mut self.crossfade_vowel_ms),
            "crossfade_s_ending_ms" => set_f32(&mut self.crossfade_s_ending_ms),
            "crossfade_r_ending_ms" => set_f32(&mut self.crossfade_r_ending_ms),
            "vowel_to_consonant_factor" => set_f32(&mut self.vowel_to_consonant_factor),
            "word_pause_ms" => set_f32(&mut self.word_pause_ms),
            "unknown_silence_ms" => set_f32(&mut self.unknown_silence_ms),
            "fade_in_ms" => set_f32(&mut self.fade_in_ms),
            "fade_out_ms" => set_f32(&mut self.fade_out_ms),
            "silence_threshold" => set_f32(&mut self.silence_threshold),
            "min_silence_ms" => set_f32(&mut self.min_silence_ms),
            "default_speed" => set_f32(&mut self.default_speed),
            "min_speed" => set_f32(&mut self.min_speed),
            "max_speed" => set_f32(&mut self.max_speed),
            "remove_word_silence" => self.remove_word_silence = parse_bool(value),
            "remove_dc_offset" => self.remove_dc_offset = parse_bool(value),
            "print_units" => self.print_units = parse_bool(value),
            "print_timing" => self.print_timing = parse_bool(value),
            _ => {}
        }
    }
}

fn parse_bool(value: &str) -> bool {
    value == "true" || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.crossfade_ms, 20.0);
        assert_eq!(config.word_pause_ms, 120.0);
        assert!(config.remove_word_silence);
        assert!(!config.print_units);
    }

    #[test]
    fn test_load_overrides_and_ignores_noise() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "audio:").unwrap();
        writeln!(file, "  crossfade_ms: 35.5").unwrap();
        writeln!(file, "word_pause_ms: 80").unwrap();
        writeln!(file, "remove_dc_offset: false").unwrap();
        writeln!(file, "print_units: 1").unwrap();
        writeln!(file, "unknown_key: 9").unwrap();
        writeln!(file, "not a key value line").unwrap();
        drop(file);

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.crossfade_ms, 35.5);
        assert_eq!(config.word_pause_ms, 80.0);
        assert!(!config.remove_dc_offset);
        assert!(config.print_units);
        // untouched keys keep their defaults
        assert_eq!(config.fade_in_ms, 3.0);
    }

    #[test]
    fn test_missing_file_keeps_defaults() {
        let config = EngineConfig::load("/nonexistent/config.yaml").unwrap();
        assert_eq!(config.crossfade_ms, 20.0);
    }
}
