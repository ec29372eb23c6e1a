//! Acoustic concatenation
//!
//! Splices unit audio into the output buffer with phoneme-adaptive
//! crossfades, boundary energy matching and pitch smoothing, intra-word
//! silence trimming, pauses for whitespace and punctuation, and the prosody
//! overlay on each completed word.

use std::f32::consts::PI;

use crate::audio::{dsp, pitch};
use crate::engine::config::EngineConfig;
use crate::engine::prosody::{self, ProsodyContext};
use crate::text::phonotactics;
use crate::SAMPLE_RATE;

/// RMS level every unit is normalised towards before mixing
const RMS_TARGET: f32 = 3000.0;
/// Samples examined on each side of a boundary when estimating pitch
const PITCH_WINDOW: usize = 1024;
/// Boundary pitch ratios inside this band are left alone
const PITCH_TOLERANCE: f32 = 0.15;

fn ms_to_samples(ms: f32) -> usize {
    (ms * SAMPLE_RATE as f32 / 1000.0) as usize
}

/// Rough articulatory class of a unit edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhonemeClass {
    Vowel,
    Plosive,
    Fricative,
    Nasal,
    Liquid,
    Other,
}

fn classify(c: char) -> PhonemeClass {
    if phonotactics::is_vowel(c) {
        return PhonemeClass::Vowel;
    }
    match c.to_ascii_lowercase() {
        'p' | 't' | 'k' | 'b' | 'd' | 'g' => PhonemeClass::Plosive,
        'f' | 'v' | 's' | 'z' | 'x' | 'j' => PhonemeClass::Fricative,
        'm' | 'n' => PhonemeClass::Nasal,
        'l' | 'r' => PhonemeClass::Liquid,
        _ => PhonemeClass::Other,
    }
}

fn start_class(text: &str) -> PhonemeClass {
    text.chars().next().map_or(PhonemeClass::Other, classify)
}

fn end_class(text: &str) -> PhonemeClass {
    let tail: Vec<char> = text.chars().rev().take(2).collect();
    if tail.len() == 2 {
        let pair = (tail[1].to_ascii_lowercase(), tail[0].to_ascii_lowercase());
        match pair {
            ('c', 'h') => return PhonemeClass::Fricative,
            ('n', 'h') => return PhonemeClass::Nasal,
            ('l', 'h') => return PhonemeClass::Liquid,
            _ => {}
        }
    }
    tail.first().map_or(PhonemeClass::Other, |&c| classify(c))
}

/// Crossfade length for a transition between two units, in milliseconds
fn adaptive_crossfade_ms(prev_text: &str, next_text: &str, config: &EngineConfig) -> f32 {
    let prev_end = end_class(prev_text);
    let next_start = start_class(next_text);
    let base = config.crossfade_ms;

    let mut ms = if next_start == PhonemeClass::Plosive {
        0.2 * base
    } else if prev_end == PhonemeClass::Plosive {
        0.3 * base
    } else if prev_end == PhonemeClass::Fricative || next_start == PhonemeClass::Fricative {
        0.4 * base
    } else if prev_end == PhonemeClass::Vowel && next_start == PhonemeClass::Vowel {
        config.crossfade_vowel_ms
    } else if prev_end == PhonemeClass::Vowel {
        base * config.vowel_to_consonant_factor
    } else if prev_end == PhonemeClass::Nasal
        || prev_end == PhonemeClass::Liquid
        || next_start == PhonemeClass::Nasal
        || next_start == PhonemeClass::Liquid
    {
        0.7 * base
    } else {
        base
    };

    match prev_text.chars().last().map(|c| c.to_ascii_lowercase()) {
        Some('s') => ms = ms.min(config.crossfade_s_ending_ms),
        Some('r') => ms = ms.min(config.crossfade_r_ending_ms),
        _ => {}
    }
    ms
}

/// Growing output buffer plus the state that spans unit boundaries
pub struct Concatenator {
    config: EngineConfig,
    context: ProsodyContext,
    buffer: Vec<i16>,
    prev_text: Option<String>,
    at_word_start: bool,
    word_start_sample: usize,
    sentence_word: usize,
    utterance_word: usize,
}

impl Concatenator {
    pub fn new(config: EngineConfig, context: ProsodyContext) -> Self {
        Concatenator {
            config,
            context,
            // 10 seconds up front; the vector doubles from there on demand
            buffer: Vec::with_capacity(SAMPLE_RATE as usize * 10),
            prev_text: None,
            at_word_start: true,
            word_start_sample: 0,
            sentence_word: 0,
            utterance_word: 0,
        }
    }

    /// Is the next unit the first of its word?
    pub fn at_word_start(&self) -> bool {
        self.at_word_start
    }

    /// Append one matched unit
    pub fn push_unit(&mut self, text: &str, samples: &[i16]) {
        if samples.is_empty() {
            return;
        }
        let mut scratch = samples.to_vec();
        if self.config.remove_dc_offset {
            dsp::remove_dc(&mut scratch);
        }
        dsp::normalize_rms(&mut scratch, RMS_TARGET);

        if self.at_word_start || self.buffer.is_empty() {
            dsp::fade_in(&mut scratch, ms_to_samples(self.config.fade_in_ms));
            self.buffer.extend_from_slice(&scratch);
        } else {
            let ms = match &self.prev_text {
                Some(prev) => adaptive_crossfade_ms(prev, text, &self.config),
                None => self.config.crossfade_ms,
            };
            let overlap = ms_to_samples(ms).min(self.buffer.len()).min(scratch.len());
            if overlap > 0 {
                self.smooth_boundary_pitch(&mut scratch, overlap);
                self.match_boundary_energy(&mut scratch, overlap);
            }
            self.mix_crossfade(&scratch, overlap);
        }

        self.prev_text = Some(text.to_string());
        self.at_word_start = false;
    }

    /// Append the silence substituted for an unmapped character
    pub fn push_unknown(&mut self) {
        self.append_silence(ms_to_samples(self.config.unknown_silence_ms));
        self.prev_text = None;
    }

    /// Complete the current word at a whitespace boundary
    pub fn word_break(&mut self) {
        self.complete_word();
        self.fade_out_tail();
        self.append_silence(ms_to_samples(self.config.word_pause_ms));
        self.start_next_word();
    }

    /// Complete the current word at `, ; : . ! ?`, scaling the pause
    pub fn punctuation_break(&mut self, punctuation: char) {
        self.complete_word();
        let scale = match punctuation {
            ',' => 0.5,
            ';' | ':' => 0.7,
            '.' => 1.2,
            '!' => 1.3,
            '?' => 1.2,
            _ => 1.0,
        };
        self.fade_out_tail();
        self.append_silence(ms_to_samples(self.config.word_pause_ms * scale));
        self.start_next_word();
        if matches!(punctuation, '.' | '!' | '?') {
            self.sentence_word = 0;
        }
    }

    /// Finish the utterance: shape the trailing word and fade out
    pub fn finish(mut self) -> Vec<i16> {
        self.complete_word();
        self.fade_out_tail();
        self.buffer
    }

    fn start_next_word(&mut self) {
        self.word_start_sample = self.buffer.len();
        self.at_word_start = true;
        self.prev_text = None;
    }

    fn fade_out_tail(&mut self) {
        dsp::fade_out(&mut self.buffer, ms_to_samples(self.config.fade_out_ms));
    }

    fn append_silence(&mut self, count: usize) {
        self.buffer.resize(self.buffer.len() + count, 0);
    }

    /// Trim silence inside the completed word, then overlay prosody
    fn complete_word(&mut self) {
        if self.buffer.len() <= self.word_start_sample {
            return;
        }
        if self.config.remove_word_silence {
            let min_run = ms_to_samples(self.config.min_silence_ms);
            let word = &mut self.buffer[self.word_start_sample..];
            if word.len() > min_run {
                let new_len =
                    dsp::compact_silence(word, self.config.silence_threshold, min_run);
                self.buffer.truncate(self.word_start_sample + new_len);
            }
        }
        prosody::shape_word(
            &mut self.buffer[self.word_start_sample..],
            &self.context,
            self.sentence_word,
            self.utterance_word,
        );
        self.sentence_word += 1;
        self.utterance_word += 1;
    }

    /// Raised-cosine crossfade over `overlap` samples, then append the tail
    fn mix_crossfade(&mut self, scratch: &[i16], overlap: usize) {
        if overlap > 0 {
            let fade_start = self.buffer.len() - overlap;
            for i in 0..overlap {
                let t = i as f32 / overlap as f32;
                let prev_gain = 0.5 * (1.0 + (PI * t).cos());
                let next_gain = 0.5 * (1.0 - (PI * t).cos());
                let mixed = self.buffer[fade_start + i] as f32 * prev_gain
                    + scratch[i] as f32 * next_gain;
                self.buffer[fade_start + i] = mixed
                    .round()
                    .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            }
        }
        self.buffer.extend_from_slice(&scratch[overlap..]);
    }

    /// Ramp the head of the new unit towards the tail energy of the buffer
    fn match_boundary_energy(&mut self, scratch: &mut [i16], overlap: usize) {
        let tail_rms = dsp::rms(&self.buffer[self.buffer.len() - overlap..]);
        let head_rms = dsp::rms(&scratch[..overlap]);
        if tail_rms < 1.0 || head_rms < 1.0 {
            return;
        }
        let ratio = (tail_rms / head_rms).clamp(0.5, 2.0);
        for i in 0..overlap {
            let t = i as f32 / overlap as f32;
            let gain = ratio * (1.0 - t) + t;
            scratch[i] = (scratch[i] as f32 * gain)
                .round()
                .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        }
    }

    /// Nudge the head of the new unit towards the previous pitch
    ///
    /// When both sides are voiced and their F0 ratio leaves [0.85, 1.15],
    /// the head region is resampled towards a gentler ratio and blended back
    /// into the original over a linear ramp.
    fn smooth_boundary_pitch(&self, scratch: &mut [i16], overlap: usize) {
        let tail_start = self.buffer.len().saturating_sub(PITCH_WINDOW);
        let prev_f0 = pitch::estimate_f0(&self.buffer[tail_start..], SAMPLE_RATE);
        let head_len = scratch.len().min(PITCH_WINDOW);
        let next_f0 = pitch::estimate_f0(&scratch[..head_len], SAMPLE_RATE);
        if prev_f0 <= 0.0 || next_f0 <= 0.0 {
            return;
        }

        let ratio = next_f0 / prev_f0;
        if (ratio - 1.0).abs() <= PITCH_TOLERANCE {
            return;
        }
        let target = 1.0 + (ratio - 1.0) * 0.5;
        let region = overlap.min(scratch.len() / 4);
        if region < 2 {
            return;
        }

        // Linear-interpolation resample of the head by target/ratio
        let factor = target / ratio;
        let shifted: Vec<f32> = (0..region)
            .map(|i| {
                let src = i as f32 * factor;
                let base = src as usize;
                let frac = src - base as f32;
                let a = scratch.get(base).copied().unwrap_or(0) as f32;
                let b = scratch.get(base + 1).copied().unwrap_or(0) as f32;
                a * (1.0 - frac) + b * frac
            })
            .collect();

        for (i, &value) in shifted.iter().enumerate() {
            let t = i as f32 / region as f32;
            let blended = value * (1.0 - t) + scratch[i] as f32 * t;
            scratch[i] = blended
                .round()
                .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_context() -> ProsodyContext {
        ProsodyContext {
            word_count: 1,
            question: false,
            exclamation: false,
        }
    }

    fn tone(len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| (8000.0 * (2.0 * PI * 150.0 * i as f32 / SAMPLE_RATE as f32).sin()) as i16)
            .collect()
    }

    #[test]
    fn test_classify_edges() {
        assert_eq!(start_class("pato"), PhonemeClass::Plosive);
        assert_eq!(start_class("ave"), PhonemeClass::Vowel);
        assert_eq!(start_class("já"), PhonemeClass::Fricative);
        assert_eq!(end_class("mar"), PhonemeClass::Liquid);
        assert_eq!(end_class("manh"), PhonemeClass::Nasal);
        assert_eq!(end_class("rech"), PhonemeClass::Fricative);
        assert_eq!(end_class("olá"), PhonemeClass::Vowel);
        assert_eq!(end_class("ç"), PhonemeClass::Other);
    }

    #[test]
    fn test_adaptive_crossfade_ordering() {
        let config = EngineConfig::default();
        // plosive start wins over everything
        assert_eq!(adaptive_crossfade_ms("sa", "ta", &config), 0.2 * 20.0);
        // plosive ending
        assert_eq!(adaptive_crossfade_ms("ad", "ma", &config), 0.3 * 20.0);
        // fricative on either side
        assert_eq!(adaptive_crossfade_ms("ma", "fa", &config), 0.4 * 20.0);
        // vowel to vowel uses the long crossfade
        assert_eq!(adaptive_crossfade_ms("la", "o", &config), 45.0);
        // vowel to consonant halves the base
        assert_eq!(adaptive_crossfade_ms("la", "ma", &config), 10.0);
        // nasal/liquid neighbourhood
        assert_eq!(adaptive_crossfade_ms("am", "la", &config), 0.7 * 20.0);
    }

    #[test]
    fn test_s_and_r_endings_cap_crossfade() {
        let config = EngineConfig {
            crossfade_s_ending_ms: 8.0,
            crossfade_r_ending_ms: 9.0,
            ..EngineConfig::default()
        };
        // "as" -> "a" would be fricative-rule 0.4*20 = 8ms; cap keeps it at 8
        assert_eq!(adaptive_crossfade_ms("as", "a", &config), 8.0);
        // liquid "ar" -> "a": 0.7*20 = 14, capped to 9
        assert_eq!(adaptive_crossfade_ms("ar", "a", &config), 9.0);
    }

    #[test]
    fn test_first_unit_gets_fade_in() {
        let mut concat = Concatenator::new(EngineConfig::default(), quiet_context());
        concat.push_unit("a", &tone(2000));
        let out = concat.finish();
        assert!(!out.is_empty());
        assert_eq!(out[0], 0);
        // the 3ms ramp keeps the head well below the settled level
        assert!(dsp::rms(&out[..30]) < dsp::rms(&out[200..400]));
    }

    #[test]
    fn test_crossfade_shortens_total_length() {
        let mut concat = Concatenator::new(EngineConfig::default(), quiet_context());
        let unit = tone(2000);
        concat.push_unit("la", &unit);
        concat.push_unit("ma", &unit);
        let out = concat.finish();
        // vowel->nasal crossfade: base/2 = 10ms = 220 samples of overlap
        assert_eq!(out.len(), 4000 - ms_to_samples(10.0));
    }

    #[test]
    fn test_word_break_inserts_pause() {
        let config = EngineConfig {
            remove_word_silence: false,
            ..EngineConfig::default()
        };
        let mut concat = Concatenator::new(config, quiet_context());
        concat.push_unit("a", &tone(2000));
        concat.word_break();
        let len_after_pause = {
            concat.push_unit("o", &tone(2000));
            concat.finish().len()
        };
        assert_eq!(len_after_pause, 2000 + ms_to_samples(120.0) + 2000);
    }

    #[test]
    fn test_punctuation_scales_pause() {
        for (mark, scale) in [(',', 0.5f32), (';', 0.7), ('.', 1.2), ('!', 1.3)] {
            let config = EngineConfig {
                remove_word_silence: false,
                ..EngineConfig::default()
            };
            let mut concat = Concatenator::new(config, quiet_context());
            concat.push_unit("a", &tone(1000));
            concat.punctuation_break(mark);
            let out = concat.finish();
            assert_eq!(
                out.len(),
                1000 + ms_to_samples(120.0 * scale),
                "pause for {mark:?}"
            );
        }
    }

    #[test]
    fn test_unknown_emits_silence_and_resets_tracking() {
        let config = EngineConfig {
            remove_word_silence: false,
            ..EngineConfig::default()
        };
        let mut concat = Concatenator::new(config, quiet_context());
        concat.push_unit("a", &tone(1000));
        concat.push_unknown();
        let out = concat.finish();
        assert_eq!(out.len(), 1000 + ms_to_samples(30.0));
        let gap = &out[1000..1000 + ms_to_samples(30.0)];
        assert!(gap.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_empty_unit_is_a_no_op() {
        let mut concat = Concatenator::new(EngineConfig::default(), quiet_context());
        concat.push_unit("a", &[]);
        assert!(concat.finish().is_empty());
    }

    #[test]
    fn test_mix_stays_bounded() {
        let mut concat = Concatenator::new(EngineConfig::default(), quiet_context());
        // full-scale square waves; normalisation and the mixing clamp keep
        // the crossfade region inside range
        let square: Vec<i16> = (0..2000)
            .map(|i| if (i / 73) % 2 == 0 { i16::MAX } else { i16::MIN })
            .collect();
        concat.push_unit("la", &square);
        concat.push_unit("o", &square);
        let out = concat.finish();
        let peak = out.iter().map(|&s| (s as i32).abs()).max().unwrap();
        assert!(peak <= 8000, "peak {peak}");
    }
}
