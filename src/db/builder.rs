//! Voice database construction
//!
//! Builds a compiled unit database from a dataset directory holding two unit
//! inventories (letters and syllables), each a `filename|text|display` index
//! file plus a directory of 16-bit PCM recordings. Recordings that fail to
//! load are skipped with a diagnostic; the text of every surviving unit is
//! lowercased before it is stored.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::audio::wav;
use crate::core::error::{Result, TtsError};
use crate::db::format::{
    fnv1a, hash_table_size, Header, IndexEntry, BITS_PER_SAMPLE, CHAIN_END, FORMAT_VERSION,
    HEADER_LEN, INDEX_ENTRY_LEN, MAGIC, SAMPLE_RATE,
};
use crate::text::normalizer;

/// Summary of a finished build, surfaced by the CLI
#[derive(Debug, Clone, Copy)]
pub struct BuildStats {
    pub unit_count: usize,
    pub max_unit_chars: usize,
    pub total_samples: u64,
}

struct BuildUnit {
    text: String,
    char_count: usize,
    hash: u32,
    samples: Vec<i16>,
}

/// Compile `<dataset_dir>` into a database at `output`
///
/// Expects `letters/wavs` + `letters/letters.txt` and `syllables/wavs` +
/// `syllables/sillabes.txt` under the dataset directory. Letters are
/// mandatory; a missing syllable inventory degrades to a letters-only voice.
pub fn build_database(dataset_dir: &Path, output: &Path) -> Result<BuildStats> {
    let mut units = Vec::new();

    load_units(
        &dataset_dir.join("letters/wavs"),
        &dataset_dir.join("letters/letters.txt"),
        &mut units,
    )?;
    info!(count = units.len(), "loaded letter units");

    let before = units.len();
    match load_units(
        &dataset_dir.join("syllables/wavs"),
        &dataset_dir.join("syllables/sillabes.txt"),
        &mut units,
    ) {
        Ok(()) => info!(count = units.len() - before, "loaded syllable units"),
        Err(err) => warn!("no syllable inventory: {err}"),
    }

    write_database(units, output)
}

/// Load one unit inventory, appending `(text, samples)` pairs
fn load_units(
    wav_dir: &Path,
    index_file: &Path,
    units: &mut Vec<(String, Vec<i16>)>,
) -> Result<()> {
    let content = std::fs::read_to_string(index_file)
        .map_err(|e| TtsError::from_read_error(index_file.to_path_buf(), e))?;

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split('|');
        let (Some(filename), Some(text)) = (fields.next(), fields.next()) else {
            continue;
        };

        let path = wav_dir.join(format!("{filename}.wav"));
        match wav::read_wav_mono(&path) {
            Ok(samples) => units.push((normalizer::lowercase(text), samples)),
            Err(err) => warn!("skipping {}: {err}", path.display()),
        }
    }
    Ok(())
}

/// Write a set of `(text, samples)` units as a compiled database
///
/// Texts are stored as given (the build path lowercases them beforehand).
/// Units are sorted by descending character count, ties broken by text, and
/// chained into a power-of-two hash table sized for a 0.7 load factor.
pub fn write_database(units: Vec<(String, Vec<i16>)>, output: &Path) -> Result<BuildStats> {
    let mut build: Vec<BuildUnit> = units
        .into_iter()
        .map(|(text, samples)| {
            let char_count = text.chars().count();
            let hash = fnv1a(text.as_bytes());
            BuildUnit {
                text,
                char_count,
                hash,
                samples,
            }
        })
        .collect();
    build.sort_by(|a, b| {
        b.char_count
            .cmp(&a.char_count)
            .then_with(|| a.text.cmp(&b.text))
    });

    for unit in &build {
        if unit.text.is_empty() || unit.text.len() > u16::MAX as usize {
            return Err(TtsError::InvalidArg(format!(
                "unit text length {} out of range",
                unit.text.len()
            )));
        }
    }

    let unit_count = build.len();
    let strings_size: usize = build.iter().map(|u| u.text.len() + 1).sum();
    let total_samples: u64 = build.iter().map(|u| u.samples.len() as u64).sum();
    let max_unit_chars = build.iter().map(|u| u.char_count).max().unwrap_or(0);
    if total_samples > u32::MAX as u64 {
        return Err(TtsError::InvalidArg(format!(
            "audio pool of {total_samples} samples exceeds format limit"
        )));
    }

    let table_size = hash_table_size(unit_count);
    let index_offset = HEADER_LEN;
    let hash_table_offset = index_offset + unit_count * INDEX_ENTRY_LEN;
    let strings_offset = hash_table_offset + table_size * 4;
    let audio_offset = strings_offset + strings_size;

    // Index entries and bucket chains; chains append at the tail so the
    // first unit inserted for a hash stays first.
    let mut entries: Vec<IndexEntry> = Vec::with_capacity(unit_count);
    let mut table = vec![CHAIN_END; table_size];
    let mut string_pos = 0u32;
    let mut audio_pos = 0u32;
    for (i, unit) in build.iter().enumerate() {
        entries.push(IndexEntry {
            hash: unit.hash,
            string_offset: string_pos,
            string_len: unit.text.len() as u16,
            char_count: unit.char_count as u16,
            audio_offset: audio_pos,
            sample_count: unit.samples.len() as u32,
            flags: 0,
            next_hash: CHAIN_END,
        });
        let slot = (unit.hash % table_size as u32) as usize;
        if table[slot] == CHAIN_END {
            table[slot] = i as u32;
        } else {
            let mut prev = table[slot] as usize;
            while entries[prev].next_hash != CHAIN_END {
                prev = entries[prev].next_hash as usize;
            }
            entries[prev].next_hash = i as u32;
        }
        string_pos += unit.text.len() as u32 + 1;
        audio_pos += unit.samples.len() as u32;
    }

    let header = Header {
        magic: MAGIC,
        version: FORMAT_VERSION,
        unit_count: unit_count as u32,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        index_offset: index_offset as u32,
        strings_offset: strings_offset as u32,
        audio_offset: audio_offset as u32,
        total_samples: total_samples as u32,
        max_unit_chars: max_unit_chars as u32,
        hash_table_size: table_size as u32,
        hash_table_offset: hash_table_offset as u32,
    };

    let write_err = |e: std::io::Error| TtsError::FileWrite {
        path: output.to_path_buf(),
        source: e,
    };

    let file = File::create(output).map_err(write_err)?;
    let mut out = BufWriter::new(file);
    out.write_all(&header.encode()).map_err(write_err)?;
    for entry in &entries {
        out.write_all(&entry.encode()).map_err(write_err)?;
    }
    for slot in &table {
        out.write_all(&slot.to_le_bytes()).map_err(write_err)?;
    }
    for unit in &build {
        out.write_all(unit.text.as_bytes()).map_err(write_err)?;
        out.write_all(&[0]).map_err(write_err)?;
    }
    for unit in &build {
        for &sample in &unit.samples {
            out.write_all(&sample.to_le_bytes()).map_err(write_err)?;
        }
    }
    out.flush().map_err(write_err)?;

    Ok(BuildStats {
        unit_count,
        max_unit_chars,
        total_samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_reports_stats_and_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.db");
        let units = vec![
            ("ca".to_string(), vec![1i16; 30]),
            ("o".to_string(), vec![2i16; 20]),
            ("mun".to_string(), vec![3i16; 50]),
        ];
        let stats = write_database(units, &path).unwrap();
        assert_eq!(stats.unit_count, 3);
        assert_eq!(stats.max_unit_chars, 3);
        assert_eq!(stats.total_samples, 100);

        // header + index + table + strings ("mun\0ca\0o\0") + audio
        let table = hash_table_size(3);
        let expected_len = HEADER_LEN + 3 * INDEX_ENTRY_LEN + table * 4 + 9 + 200;
        assert_eq!(std::fs::metadata(&path).unwrap().len(), expected_len as u64);
    }

    #[test]
    fn test_rejects_empty_unit_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.db");
        let units = vec![(String::new(), vec![0i16; 4])];
        assert!(matches!(
            write_database(units, &path),
            Err(TtsError::InvalidArg(_))
        ));
    }

    #[test]
    fn test_build_database_requires_letters_index() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("voice.db");
        assert!(matches!(
            build_database(dir.path(), &out),
            Err(TtsError::FileNotFound { .. })
        ));
    }
}
