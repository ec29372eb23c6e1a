//! # fala-tts - Concatenative text-to-speech for Brazilian Portuguese
//!
//! Synthesizes speech by splicing prerecorded letter and syllable
//! recordings from a compact memory-mapped voice database. Input text is
//! rewritten (numbers to words, user rules, lowercasing), segmented into
//! database units with Portuguese phonotactic scoring, and concatenated
//! with phoneme-adaptive crossfades, prosodic shaping, and optional
//! time stretching.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use fala_tts::Engine;
//!
//! let mut engine = Engine::open("voice.db")?;
//! engine.load_config("config.yaml")?;
//! let samples = engine.synthesize("olá mundo", 1.0)?;
//! fala_tts::audio::wav::write_wav_mono("out.wav", &samples, fala_tts::SAMPLE_RATE)?;
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module |
//! |-------|--------|
//! | Database build / open / lookup | [`db`] |
//! | Text rewriting and phonotactics | [`text`] |
//! | Unit selection | [`engine::selector`] |
//! | Concatenation and prosody | [`engine::concat`], [`engine::prosody`] |
//! | Signal utilities, pitch, stretching | [`audio`] |

pub mod audio;
pub mod core;
pub mod db;
pub mod engine;
pub mod text;

pub use crate::core::error::{Result, TtsError};
pub use crate::db::VoiceDb;
pub use crate::engine::{Engine, EngineConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sample rate of every voice database and synthesized waveform (22 050 Hz)
pub const SAMPLE_RATE: u32 = 22_050;
