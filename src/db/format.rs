//! On-disk voice database format
//!
//! The database is a single little-endian file with four sections laid out
//! back to back: a 64-byte header, the unit index (32 bytes per unit, sorted
//! by descending character count), a power-of-two hash table of `u32` slots
//! chained through the index, a NUL-terminated UTF-8 string pool, and the raw
//! `i16` PCM audio pool. Everything is decoded with explicit byte-offset
//! reads so the mapping is never reinterpreted in place.

use crate::core::error::{Result, TtsError};

/// "CTTS" in little-endian
pub const MAGIC: u32 = 0x5354_5443;
/// Current database format version
pub const FORMAT_VERSION: u32 = 1;
/// Output sample rate for every unit recording
pub const SAMPLE_RATE: u32 = 22_050;
/// Sample width of the audio pool
pub const BITS_PER_SAMPLE: u32 = 16;
/// Byte length of the file header
pub const HEADER_LEN: usize = 64;
/// Byte length of one index entry
pub const INDEX_ENTRY_LEN: usize = 32;
/// Hash-table slot / chain terminator
pub const CHAIN_END: u32 = 0xFFFF_FFFF;
/// Maximum hash-table load factor used when sizing the table
pub const HASH_TABLE_LOAD: f64 = 0.7;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// FNV-1a hash over raw bytes, as stored in the index entries
pub fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Smallest power of two holding `unit_count` entries at the target load
pub fn hash_table_size(unit_count: usize) -> usize {
    let mut size = 1usize;
    while (size as f64) < unit_count as f64 / HASH_TABLE_LOAD {
        size *= 2;
    }
    size
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Database file header
///
/// All offsets are byte offsets from the start of the file; per-entry audio
/// offsets in the index are in samples relative to `audio_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub version: u32,
    pub unit_count: u32,
    pub sample_rate: u32,
    pub bits_per_sample: u32,
    pub index_offset: u32,
    pub strings_offset: u32,
    pub audio_offset: u32,
    pub total_samples: u32,
    pub max_unit_chars: u32,
    pub hash_table_size: u32,
    pub hash_table_offset: u32,
}

impl Header {
    /// Serialise to the on-disk layout
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        let fields = [
            self.magic,
            self.version,
            self.unit_count,
            self.sample_rate,
            self.bits_per_sample,
            self.index_offset,
            self.strings_offset,
            self.audio_offset,
            self.total_samples,
            self.max_unit_chars,
            self.hash_table_size,
            self.hash_table_offset,
        ];
        for (i, field) in fields.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&field.to_le_bytes());
        }
        // bytes 48..64 stay reserved / zero
        out
    }

    /// Decode and validate a header from the start of a mapped file
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(TtsError::InvalidFormat(format!(
                "file too short for header ({} bytes)",
                bytes.len()
            )));
        }
        let header = Header {
            magic: read_u32(bytes, 0),
            version: read_u32(bytes, 4),
            unit_count: read_u32(bytes, 8),
            sample_rate: read_u32(bytes, 12),
            bits_per_sample: read_u32(bytes, 16),
            index_offset: read_u32(bytes, 20),
            strings_offset: read_u32(bytes, 24),
            audio_offset: read_u32(bytes, 28),
            total_samples: read_u32(bytes, 32),
            max_unit_chars: read_u32(bytes, 36),
            hash_table_size: read_u32(bytes, 40),
            hash_table_offset: read_u32(bytes, 44),
        };
        if header.magic != MAGIC {
            return Err(TtsError::InvalidFormat(format!(
                "bad magic 0x{:08X}",
                header.magic
            )));
        }
        if header.version != FORMAT_VERSION {
            return Err(TtsError::VersionMismatch {
                found: header.version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(header)
    }
}

/// One unit record in the index section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub hash: u32,
    /// Byte offset into the string pool
    pub string_offset: u32,
    /// Text length in bytes
    pub string_len: u16,
    /// Text length in code points
    pub char_count: u16,
    /// Offset into the audio pool, in samples
    pub audio_offset: u32,
    pub sample_count: u32,
    pub flags: u32,
    /// Index of the next entry in the same hash bucket, or [`CHAIN_END`]
    pub next_hash: u32,
}

impl IndexEntry {
    /// Serialise to the on-disk layout
    pub fn encode(&self) -> [u8; INDEX_ENTRY_LEN] {
        let mut out = [0u8; INDEX_ENTRY_LEN];
        out[0..4].copy_from_slice(&self.hash.to_le_bytes());
        out[4..8].copy_from_slice(&self.string_offset.to_le_bytes());
        out[8..10].copy_from_slice(&self.string_len.to_le_bytes());
        out[10..12].copy_from_slice(&self.char_count.to_le_bytes());
        out[12..16].copy_from_slice(&self.audio_offset.to_le_bytes());
        out[16..20].copy_from_slice(&self.sample_count.to_le_bytes());
        out[20..24].copy_from_slice(&self.flags.to_le_bytes());
        out[24..28].copy_from_slice(&self.next_hash.to_le_bytes());
        // bytes 28..32 reserved
        out
    }

    /// Decode one entry; `bytes` must hold [`INDEX_ENTRY_LEN`] bytes
    pub fn decode(bytes: &[u8]) -> Self {
        IndexEntry {
            hash: read_u32(bytes, 0),
            string_offset: read_u32(bytes, 4),
            string_len: read_u16(bytes, 8),
            char_count: read_u16(bytes, 10),
            audio_offset: read_u32(bytes, 12),
            sample_count: read_u32(bytes, 16),
            flags: read_u32(bytes, 20),
            next_hash: read_u32(bytes, 24),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_vectors() {
        assert_eq!(fnv1a(b""), 2_166_136_261);
        assert_eq!(fnv1a(b"a"), 0xE40C_292C);
        assert_eq!(fnv1a(b"foobar"), 0xBF9C_F968);
    }

    #[test]
    fn test_hash_table_size() {
        assert_eq!(hash_table_size(0), 1);
        assert_eq!(hash_table_size(1), 2);
        assert_eq!(hash_table_size(11), 16);
        // 45 / 0.7 = 64.3 -> 128
        assert_eq!(hash_table_size(45), 128);
    }

    #[test]
    fn test_header_round_trip() {
        let header = Header {
            magic: MAGIC,
            version: FORMAT_VERSION,
            unit_count: 42,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: BITS_PER_SAMPLE,
            index_offset: 64,
            strings_offset: 5000,
            audio_offset: 6000,
            total_samples: 120_000,
            max_unit_chars: 4,
            hash_table_size: 64,
            hash_table_offset: 64 + 42 * 32,
        };
        let bytes = header.encode();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(Header::decode(&bytes).unwrap(), header);
    }

    #[test]
    fn test_header_rejects_bad_magic_and_version() {
        let mut header = Header {
            magic: MAGIC,
            version: FORMAT_VERSION,
            unit_count: 0,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: BITS_PER_SAMPLE,
            index_offset: 64,
            strings_offset: 64,
            audio_offset: 64,
            total_samples: 0,
            max_unit_chars: 0,
            hash_table_size: 1,
            hash_table_offset: 64,
        };

        header.magic = 0xDEAD_BEEF;
        assert!(matches!(
            Header::decode(&header.encode()),
            Err(TtsError::InvalidFormat(_))
        ));

        header.magic = MAGIC;
        header.version = 9;
        assert!(matches!(
            Header::decode(&header.encode()),
            Err(TtsError::VersionMismatch { found: 9, .. })
        ));
    }

    #[test]
    fn test_index_entry_round_trip() {
        let entry = IndexEntry {
            hash: fnv1a("lá".as_bytes()),
            string_offset: 17,
            string_len: 3,
            char_count: 2,
            audio_offset: 44_100,
            sample_count: 2_205,
            flags: 0,
            next_hash: CHAIN_END,
        };
        assert_eq!(IndexEntry::decode(&entry.encode()), entry);
    }
}
