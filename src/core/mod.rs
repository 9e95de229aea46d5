//! Core dialogue logic
//!
//! Value extraction from transcripts and localized prompt generation.

pub mod extractor;
pub mod prompts;

pub use extractor::ValueExtractor;
pub use prompts::PromptGenerator;
