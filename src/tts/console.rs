//! Console TTS engine: prints prompts instead of speaking them

use super::{TtsEngine, VoiceParams};
use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;

#[derive(Debug, Default)]
pub struct ConsoleEngine;

impl ConsoleEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TtsEngine for ConsoleEngine {
    async fn speak(&self, text: &str, _voice: &VoiceParams) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "🔊 {}", text)?;
        out.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
