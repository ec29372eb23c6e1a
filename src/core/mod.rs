//! Core framework: error types shared by every module

pub mod error;

pub use error::{Result, TtsError};
