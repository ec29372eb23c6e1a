//! Prosody overlay
//!
//! A pre-synthesis scan of the raw input yields the utterance shape (word
//! count, question/exclamation ending); each completed word is then shaped
//! with an energy declination and, for questions, a rising envelope over the
//! last two words.

/// Declination slope across the utterance
const DECLINATION_DEPTH: f32 = 0.05;
/// Question rise on the very last word
const RISE_LAST: f32 = 0.15;
/// Question rise on the second-to-last word
const RISE_PENULTIMATE: f32 = 0.08;

/// Utterance shape captured from the raw input before preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProsodyContext {
    /// Maximal runs of non-whitespace
    pub word_count: usize,
    /// Input ends with `?`
    pub question: bool,
    /// Input ends with `!` (tracked; no distinct contour yet)
    pub exclamation: bool,
}

impl ProsodyContext {
    /// Scan raw input text
    pub fn scan(text: &str) -> Self {
        let word_count = text.split_whitespace().count();
        let last = text.trim_end().chars().last();
        ProsodyContext {
            word_count,
            question: last == Some('?'),
            exclamation: last == Some('!'),
        }
    }
}

/// Shape one completed word in place
///
/// `sentence_word` is the word's index within the current sentence (reset at
/// sentence-final punctuation) and drives declination; `utterance_word` is
/// its absolute position and decides whether the question rise applies.
pub fn shape_word(
    samples: &mut [i16],
    context: &ProsodyContext,
    sentence_word: usize,
    utterance_word: usize,
) {
    if samples.is_empty() {
        return;
    }

    let span = context.word_count.saturating_sub(1).max(1);
    let progress = (sentence_word as f32 / span as f32).min(1.0);
    let declination = 1.0 - DECLINATION_DEPTH * progress;
    for sample in samples.iter_mut() {
        *sample = (*sample as f32 * declination)
            .round()
            .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    }

    if context.question && context.word_count > 0 && utterance_word + 2 >= context.word_count {
        let delta = if utterance_word + 1 == context.word_count {
            RISE_LAST
        } else {
            RISE_PENULTIMATE
        };
        let len = samples.len() as f32;
        for (i, sample) in samples.iter_mut().enumerate() {
            let t = i as f32 / len;
            let gain = 1.0 + delta * t * t;
            *sample = (*sample as f32 * gain)
                .round()
                .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan() {
        let ctx = ProsodyContext::scan("olá mundo");
        assert_eq!(ctx.word_count, 2);
        assert!(!ctx.question);
        assert!(!ctx.exclamation);

        let ctx = ProsodyContext::scan("tudo bem?  ");
        assert_eq!(ctx.word_count, 2);
        assert!(ctx.question);

        assert!(ProsodyContext::scan("já!").exclamation);
        assert_eq!(ProsodyContext::scan("").word_count, 0);
    }

    #[test]
    fn test_declination_attenuates_later_words() {
        let ctx = ProsodyContext {
            word_count: 3,
            question: false,
            exclamation: false,
        };
        let mut first = vec![10_000i16; 8];
        let mut last = vec![10_000i16; 8];
        shape_word(&mut first, &ctx, 0, 0);
        shape_word(&mut last, &ctx, 2, 2);

        assert_eq!(first[0], 10_000); // progress 0, unity gain
        assert_eq!(last[0], 9_500); // full declination
    }

    #[test]
    fn test_question_rise_on_final_word() {
        let ctx = ProsodyContext {
            word_count: 1,
            question: true,
            exclamation: false,
        };
        let mut word = vec![10_000i16; 100];
        shape_word(&mut word, &ctx, 0, 0);

        // quadratic rise: early samples near unity, late samples boosted
        assert!(word[1] <= 10_000);
        assert!(word[99] > 11_000);
    }

    #[test]
    fn test_no_rise_on_statement() {
        let ctx = ProsodyContext {
            word_count: 1,
            question: false,
            exclamation: false,
        };
        let mut word = vec![10_000i16; 100];
        shape_word(&mut word, &ctx, 0, 0);
        assert!(word[99] <= 10_000);
    }
}
