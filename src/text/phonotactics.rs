//! Portuguese phonotactic oracle
//!
//! Classifies letters and scores candidate segmentations so the selector
//! prefers spans that read as Portuguese syllables: digraphs stay together,
//! onset clusters and open syllables win ties, and a bare consonant never
//! opens a word.

/// Vowels, including every accented vowel Portuguese orthography uses
pub fn is_vowel(c: char) -> bool {
    matches!(
        c,
        'a' | 'e'
            | 'i'
            | 'o'
            | 'u'
            | 'A'
            | 'E'
            | 'I'
            | 'O'
            | 'U'
            | 'á'
            | 'Á'
            | 'à'
            | 'À'
            | 'â'
            | 'Â'
            | 'ã'
            | 'Ã'
            | 'é'
            | 'É'
            | 'ê'
            | 'Ê'
            | 'í'
            | 'Í'
            | 'ó'
            | 'Ó'
            | 'ô'
            | 'Ô'
            | 'õ'
            | 'Õ'
            | 'ú'
            | 'Ú'
            | 'ü'
            | 'Ü'
    )
}

/// Letters that are not vowels; `ç` counts
pub fn is_consonant(c: char) -> bool {
    (c.is_ascii_alphabetic() || c == 'ç' || c == 'Ç') && !is_vowel(c)
}

fn first_two_lower(text: &str) -> Option<(char, char)> {
    let mut chars = text.chars();
    let a = chars.next()?.to_ascii_lowercase();
    let b = chars.next()?.to_ascii_lowercase();
    Some((a, b))
}

/// Does the text open with an indivisible digraph (`ch lh nh qu gu`)?
pub fn is_digraph(text: &str) -> bool {
    matches!(
        first_two_lower(text),
        Some(('c', 'h') | ('l', 'h') | ('n', 'h') | ('q', 'u') | ('g', 'u'))
    )
}

/// Does the text open with a valid onset cluster (obstruent + liquid)?
pub fn is_onset_cluster(text: &str) -> bool {
    match first_two_lower(text) {
        Some((c, 'r')) => matches!(c, 'p' | 'b' | 't' | 'd' | 'c' | 'g' | 'f' | 'v'),
        Some((c, 'l')) => matches!(c, 'p' | 'b' | 'c' | 'g' | 'f'),
        _ => false,
    }
}

/// Should a single-character match at the head of `text` be rejected?
///
/// A lone consonant is rejected at a word start, and anywhere when it would
/// split a digraph with the following letter.
pub fn rejects_single_char(text: &str, match_chars: usize, at_word_start: bool) -> bool {
    if match_chars != 1 {
        return false;
    }
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if is_vowel(first) || !is_consonant(first) {
        return false;
    }
    if at_word_start {
        return true;
    }
    match chars.next() {
        Some(next) => matches!(
            (first.to_ascii_lowercase(), next.to_ascii_lowercase()),
            ('c', 'h') | ('l', 'h') | ('n', 'h') | ('q', 'u') | ('g', 'u')
        ),
        None => false,
    }
}

/// Syllable quality score for a candidate span
///
/// Longer spans score higher; digraphs, onset clusters, word-initial CV
/// shapes, and open syllables earn bonuses, while a bare word-initial
/// consonant is penalised heavily.
pub fn syllable_score(span: &str, at_word_start: bool) -> i32 {
    let char_count = span.chars().count();
    if char_count == 0 {
        return -1000;
    }
    let mut score = 10 * char_count as i32;

    if char_count >= 2 {
        if is_digraph(span) {
            score += 20;
        }
        if is_onset_cluster(span) {
            score += 15;
        }
    }

    let mut chars = span.chars();
    let first = chars.next();
    let second = chars.next();
    if at_word_start && first.is_some_and(is_consonant) {
        if char_count == 1 {
            score -= 100;
        } else if second.is_some_and(is_vowel) {
            score += 25;
        }
    }

    if span.chars().last().is_some_and(is_vowel) {
        score += 10;
    }

    score
}
