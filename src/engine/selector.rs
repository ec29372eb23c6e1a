//! Unit selection
//!
//! Greedy longest-match segmentation with one step of look-ahead and
//! phonotactic scoring. At each position every database span up to the
//! word's end is collected as a candidate; the winner maximises syllable
//! quality first, combined coverage second, with boundary-aware tie breaks.

use crate::db::VoiceDb;
use crate::text::phonotactics;

/// Punctuation that inserts a scaled pause
pub fn is_pause_punctuation(c: char) -> bool {
    matches!(c, ',' | ';' | ':' | '.' | '!' | '?')
}

/// Characters consumed without emitting audio or touching word state
pub fn is_ignorable(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '"' | '\'' | '`')
}

/// Any character the selector must not cross when forming a span
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || is_pause_punctuation(c) || c == '-' || is_ignorable(c)
}

/// Winning span at one position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Bytes consumed from the input
    pub byte_len: usize,
    /// Index of the matched unit in the database
    pub unit_index: u32,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    byte_len: usize,
    char_count: usize,
    unit_index: u32,
    score: i32,
    /// Longest match after this span, in code points (0 = ends the word)
    next_chars: usize,
}

const MAX_CANDIDATES: usize = 64;

/// Byte offsets of the first `max_chars` char boundaries before the next
/// separator; `offsets[k]` is the byte length of a k-char span
fn span_boundaries(text: &str, max_chars: usize) -> Vec<usize> {
    let mut offsets = vec![0];
    for (pos, c) in text.char_indices() {
        if is_separator(c) || offsets.len() > max_chars {
            break;
        }
        offsets.push(pos + c.len_utf8());
    }
    offsets
}

/// Longest database match at `text`, in code points, ignoring phonotactics
fn longest_match_chars(db: &VoiceDb, text: &str) -> usize {
    let offsets = span_boundaries(text, db.max_unit_chars());
    for chars in (1..offsets.len()).rev() {
        if db.lookup(&text[..offsets[chars]]).is_some() {
            return chars;
        }
    }
    0
}

/// Pick the unit starting at `text`, or `None` when nothing matches
///
/// `text` is the remaining normalised buffer; spans never cross a separator.
pub fn select(db: &VoiceDb, text: &str, at_word_start: bool) -> Option<Selection> {
    let offsets = span_boundaries(text, db.max_unit_chars());

    let mut candidates: Vec<Candidate> = Vec::new();
    for chars in (1..offsets.len()).rev() {
        if candidates.len() == MAX_CANDIDATES {
            break;
        }
        let byte_len = offsets[chars];
        let span = &text[..byte_len];
        let Some(unit_index) = db.lookup(span) else {
            continue;
        };
        if phonotactics::rejects_single_char(text, chars, at_word_start) {
            continue;
        }
        candidates.push(Candidate {
            byte_len,
            char_count: chars,
            unit_index,
            score: phonotactics::syllable_score(span, at_word_start),
            next_chars: 0,
        });
    }

    if candidates.is_empty() {
        return None;
    }
    if candidates.len() == 1 {
        return Some(Selection {
            byte_len: candidates[0].byte_len,
            unit_index: candidates[0].unit_index,
        });
    }

    for candidate in candidates.iter_mut() {
        let rest = text[candidate.byte_len..].trim_start();
        if !rest.is_empty() {
            candidate.next_chars = longest_match_chars(db, rest);
        }
    }

    let mut best = 0;
    for i in 1..candidates.len() {
        let challenger = candidates[i];
        let incumbent = candidates[best];

        if challenger.score != incumbent.score {
            if challenger.score > incumbent.score {
                best = i;
            }
            continue;
        }
        let challenger_total = challenger.char_count + challenger.next_chars;
        let incumbent_total = incumbent.char_count + incumbent.next_chars;
        if challenger_total != incumbent_total {
            if challenger_total > incumbent_total {
                best = i;
            }
            continue;
        }

        let incumbent_ends = incumbent.next_chars == 0;
        let challenger_ends = challenger.next_chars == 0;
        match (incumbent_ends, challenger_ends) {
            (true, false) => {}
            (false, true) => best = i,
            (true, true) => {
                if challenger.char_count > incumbent.char_count {
                    best = i;
                }
            }
            (false, false) => {
                if challenger.next_chars > incumbent.next_chars {
                    best = i;
                }
            }
        }
    }

    Some(Selection {
        byte_len: candidates[best].byte_len,
        unit_index: candidates[best].unit_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::builder::write_database;

    fn test_db(units: &[&str]) -> (tempfile::TempDir, VoiceDb) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.db");
        let pairs = units
            .iter()
            .map(|text| (text.to_string(), vec![1000i16; 500]))
            .collect();
        write_database(pairs, &path).unwrap();
        let db = VoiceDb::open(&path).unwrap();
        (dir, db)
    }

    fn selected_text<'a>(db: &VoiceDb, text: &'a str, at_word_start: bool) -> Option<&'a str> {
        select(db, text, at_word_start).map(|s| &text[..s.byte_len])
    }

    #[test]
    fn test_no_single_consonant_at_word_start() {
        let (_dir, db) = test_db(&["l", "a", "o", "lá", "ol", "á"]);
        // "lado": "l" alone is the only span covering position 0 -> rejected
        assert_eq!(select(&db, "ldo", true), None);
        // but "lá" is a fine word opener
        assert_eq!(selected_text(&db, "lá", true), Some("lá"));
    }

    #[test]
    fn test_digraph_never_split() {
        let (_dir, db) = test_db(&["c", "h", "a", "cha"]);
        // the 3-char unit wins; the bare "c" (digraph head) is rejected
        assert_eq!(selected_text(&db, "chave", true), Some("cha"));
        // mid-word, "c" before "h" would split the digraph and "ch" is not a
        // unit, so nothing can match
        assert_eq!(select(&db, "chz", false), None);
    }

    #[test]
    fn test_lookahead_prefers_better_continuation() {
        let (_dir, db) = test_db(&["o", "l", "á", "ol", "lá", "a"]);
        // "olá": "o"+"lá" (total 3) beats "ol"+"á" (total 3) via the
        // larger-look-ahead tie break
        assert_eq!(selected_text(&db, "olá", true), Some("o"));
    }

    #[test]
    fn test_coverage_beats_shorter_total() {
        let (_dir, db) = test_db(&["mu", "mun", "do", "o", "u"]);
        // "mundo": "mun"+"do" covers 5 chars, "mu" leaves a stranded "n"
        assert_eq!(selected_text(&db, "mundo", true), Some("mun"));
    }

    #[test]
    fn test_spans_stop_at_separators() {
        let (_dir, db) = test_db(&["a", "ab"]);
        // span may not cross the space
        assert_eq!(selected_text(&db, "a b", true), Some("a"));
    }

    #[test]
    fn test_word_initial_sibilant_needs_vowel() {
        let (_dir, db) = test_db(&["sa", "s", "a"]);
        // "s" alone cannot open the word; the CV span is the only candidate
        assert_eq!(selected_text(&db, "sa", true), Some("sa"));
    }

    #[test]
    fn test_empty_and_unknown() {
        let (_dir, db) = test_db(&["a"]);
        assert_eq!(select(&db, "", true), None);
        assert_eq!(select(&db, "zzz", true), None);
    }
}
