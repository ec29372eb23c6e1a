//! Audio processing: WAV I/O, signal utilities, pitch, time stretching

pub mod dsp;
pub mod pitch;
pub mod stretch;
pub mod wav;
