//! TTS (Text-to-Speech) Module
//!
//! Provides a unified interface for speech output backends and the
//! [`Speaker`] that sequences prompts before listening resumes.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub mod console;
pub mod speaker;
pub mod system;

pub use speaker::Speaker;

/// Voice settings for one utterance
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    /// Language tag such as "en-US"
    pub language: String,
    /// Relative rate, 1.0 is normal
    pub rate: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            rate: 0.95,
        }
    }
}

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync + std::fmt::Debug {
    /// Speak the given text, resolving once it has been fully spoken
    async fn speak(&self, text: &str, voice: &VoiceParams) -> Result<()>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Factory to create the configured TTS engine.
///
/// `none` yields no engine: prompts are shown but not spoken.
pub fn create_engine(name: &str) -> Option<Arc<dyn TtsEngine>> {
    info!("🛠️ Creating TTS engine: {}", name);
    let engine: Arc<dyn TtsEngine> = match name {
        "none" => return None,
        "console" => Arc::new(console::ConsoleEngine::new()),
        "system" => Arc::new(system::SystemEngine::new()),
        other => {
            warn!("  - Unknown engine '{}', falling back to console", other);
            Arc::new(console::ConsoleEngine::new())
        }
    };
    info!("✅ TTS engine '{}' initialized", engine.name());
    Some(engine)
}
