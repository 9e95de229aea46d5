//! VoiceFill Library
//!
//! Voice-guided form filling: speaks a prompt per field, listens for the
//! answer, extracts a typed value and moves through the form with bounded
//! retries, in English or Telugu.

pub mod asr;
pub mod audio;
pub mod config;
pub mod core;
pub mod error;
pub mod fields;
pub mod i18n;
pub mod session;
pub mod tts;

pub use error::{VoiceFillError, VoiceFillResult};
