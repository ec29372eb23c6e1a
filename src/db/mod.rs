//! Voice database: build, open, and look up prerecorded units
//!
//! A database file is memory-mapped read-only for the lifetime of the
//! engine; all section access goes through bounds-checked byte decoding.

pub mod builder;
pub mod format;

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::core::error::{Result, TtsError};
use format::{fnv1a, Header, IndexEntry, CHAIN_END, HEADER_LEN, INDEX_ENTRY_LEN};

/// Read-only view over a compiled voice database
///
/// The mapping is the sole owner of unit audio for the engine's lifetime;
/// it is released when the database is dropped.
pub struct VoiceDb {
    map: Mmap,
    header: Header,
}

impl VoiceDb {
    /// Map a database file and validate its layout
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| TtsError::from_read_error(path.to_path_buf(), e))?;
        // Safety: the mapping is private and read-only; the engine owns it
        // exclusively until drop.
        let map = unsafe {
            Mmap::map(&file).map_err(|e| TtsError::from_read_error(path.to_path_buf(), e))?
        };

        let header = Header::decode(&map)?;
        let db = VoiceDb { map, header };
        db.validate()?;
        Ok(db)
    }

    fn validate(&self) -> Result<()> {
        let h = &self.header;
        let file_len = self.map.len();

        let index_end = h.index_offset as usize + h.unit_count as usize * INDEX_ENTRY_LEN;
        let table_end = h.hash_table_offset as usize + h.hash_table_size as usize * 4;
        let audio_end = h.audio_offset as usize + h.total_samples as usize * 2;

        if (h.index_offset as usize) < HEADER_LEN
            || index_end > file_len
            || table_end > file_len
            || (h.strings_offset as usize) > (h.audio_offset as usize)
            || audio_end > file_len
        {
            return Err(TtsError::InvalidFormat(
                "section offsets exceed file length".into(),
            ));
        }
        if h.hash_table_size == 0 || !h.hash_table_size.is_power_of_two() {
            return Err(TtsError::InvalidFormat(format!(
                "hash table size {} is not a power of two",
                h.hash_table_size
            )));
        }
        // The string pool was written from Rust strings; reject a corrupted
        // pool here so unit_text never has to re-check.
        let pool = &self.map[h.strings_offset as usize..h.audio_offset as usize];
        if std::str::from_utf8(pool).is_err() {
            return Err(TtsError::InvalidFormat("string pool is not UTF-8".into()));
        }
        for i in 0..h.unit_count {
            let entry = self.entry(i);
            let text_end = entry.string_offset as usize + entry.string_len as usize;
            if h.strings_offset as usize + text_end > h.audio_offset as usize {
                return Err(TtsError::InvalidFormat(format!(
                    "unit {i} text exceeds string pool"
                )));
            }
            let sample_end = entry.audio_offset as u64 + entry.sample_count as u64;
            if sample_end > h.total_samples as u64 {
                return Err(TtsError::InvalidFormat(format!(
                    "unit {i} audio exceeds audio pool"
                )));
            }
            if entry.next_hash != CHAIN_END && entry.next_hash >= h.unit_count {
                return Err(TtsError::InvalidFormat(format!(
                    "unit {i} chains to out-of-range index {}",
                    entry.next_hash
                )));
            }
        }
        for slot in 0..h.hash_table_size {
            let idx = self.hash_slot(slot);
            if idx != CHAIN_END && idx >= h.unit_count {
                return Err(TtsError::InvalidFormat(format!(
                    "hash slot {slot} points to out-of-range index {idx}"
                )));
            }
        }
        Ok(())
    }

    /// Parsed file header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of units stored
    pub fn unit_count(&self) -> u32 {
        self.header.unit_count
    }

    /// Longest unit text, in code points
    pub fn max_unit_chars(&self) -> usize {
        self.header.max_unit_chars as usize
    }

    /// Decode the index entry at `idx` (must be `< unit_count`)
    pub fn entry(&self, idx: u32) -> IndexEntry {
        let start = self.header.index_offset as usize + idx as usize * INDEX_ENTRY_LEN;
        IndexEntry::decode(&self.map[start..start + INDEX_ENTRY_LEN])
    }

    fn hash_slot(&self, slot: u32) -> u32 {
        let start = self.header.hash_table_offset as usize + slot as usize * 4;
        u32::from_le_bytes([
            self.map[start],
            self.map[start + 1],
            self.map[start + 2],
            self.map[start + 3],
        ])
    }

    /// Text label of a unit
    pub fn unit_text(&self, entry: &IndexEntry) -> &str {
        let start = self.header.strings_offset as usize + entry.string_offset as usize;
        let bytes = &self.map[start..start + entry.string_len as usize];
        // The pool is validated as UTF-8 on open
        std::str::from_utf8(bytes).unwrap_or_default()
    }

    /// Decode a unit's PCM samples into an owned buffer
    ///
    /// Per-unit transforms always run on copies; the mapping stays pristine.
    pub fn unit_samples(&self, entry: &IndexEntry) -> Vec<i16> {
        let start = self.header.audio_offset as usize + entry.audio_offset as usize * 2;
        let bytes = &self.map[start..start + entry.sample_count as usize * 2];
        bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }

    /// Find the unit whose text equals `text`, returning its index
    pub fn lookup(&self, text: &str) -> Option<u32> {
        if self.header.unit_count == 0 {
            return None;
        }
        let bytes = text.as_bytes();
        let hash = fnv1a(bytes);
        let slot = hash % self.header.hash_table_size;
        let mut idx = self.hash_slot(slot);
        // Chains are acyclic by construction; the step bound guards against
        // a corrupted file.
        let mut steps = 0;
        while idx != CHAIN_END && steps <= self.header.unit_count {
            let entry = self.entry(idx);
            if entry.hash == hash
                && entry.string_len as usize == bytes.len()
                && self.unit_text(&entry).as_bytes() == bytes
            {
                return Some(idx);
            }
            idx = entry.next_hash;
            steps += 1;
        }
        None
    }
}
