//! System TTS engine (speech-dispatcher or espeak-ng)

use super::{TtsEngine, VoiceParams};
use anyhow::Result;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Normal speaking rate of espeak-ng in words per minute
const ESPEAK_BASE_WPM: f32 = 175.0;

#[derive(Debug)]
pub struct SystemEngine;

impl Default for SystemEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Primary language subtag ("te-IN" -> "te")
fn primary_language(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// spd-say rate runs from -100 to 100 around 0
fn spd_rate(rate: f32) -> i32 {
    (((rate - 1.0) * 100.0).round() as i32).clamp(-100, 100)
}

#[async_trait]
impl TtsEngine for SystemEngine {
    async fn speak(&self, text: &str, voice: &VoiceParams) -> Result<()> {
        debug!("System speaking ({}): {}", voice.language, text);
        let lang = primary_language(&voice.language);

        // -w blocks until the message has been spoken
        let spd = Command::new("spd-say")
            .arg("-w")
            .arg("-l")
            .arg(lang)
            .arg("-r")
            .arg(spd_rate(voice.rate).to_string())
            .arg(text)
            .kill_on_drop(true)
            .status()
            .await;
        if let Ok(status) = spd {
            if status.success() {
                return Ok(());
            }
        }

        let wpm = (ESPEAK_BASE_WPM * voice.rate).round() as u32;
        let espeak = Command::new("espeak-ng")
            .arg("-v")
            .arg(lang)
            .arg("-s")
            .arg(wpm.to_string())
            .arg(text)
            .kill_on_drop(true)
            .status()
            .await;
        if let Ok(status) = espeak {
            if status.success() {
                return Ok(());
            }
        }

        Err(anyhow::anyhow!(
            "No system TTS command found (tried spd-say, espeak-ng)"
        ))
    }

    fn name(&self) -> &str {
        "system"
    }
}
