use crate::i18n::Locale;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Speech
    pub language: Locale,
    pub recognizer: String,
    pub tts_engine: String,
    pub speech_rate: f32,

    // Dialogue
    pub max_retries: u32,
    pub silence_ms: u64,
    pub listen_timeout_ms: u64,
    pub post_speech_delay_ms: u64,
    pub submit_delay_ms: u64,
    pub refresh_every_fields: usize,

    // Meta
    pub locale_dir: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Locale::En,
            recognizer: "console".to_string(),
            tts_engine: "console".to_string(),
            speech_rate: 0.95,
            max_retries: 2,
            silence_ms: 1800,
            listen_timeout_ms: 18000,
            post_speech_delay_ms: 800,
            submit_delay_ms: 300,
            refresh_every_fields: 3,
            locale_dir: dirs::data_dir()
                .unwrap_or_default()
                .join("voicefill/locale")
                .to_string_lossy()
                .to_string(),
            log_level: "INFO".to_string(),
        }
    }
}

/// Timing and retry policy for one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTimings {
    /// Failed attempts allowed after the first before a field is skipped
    pub max_retries: u32,
    /// Quiet period after a finalized segment that ends the utterance
    pub silence: Duration,
    /// Upper bound on one listening attempt
    pub listen_timeout: Duration,
    /// Guard between the end of a prompt and the start of listening
    pub post_speech_delay: Duration,
    /// Settle time between freezing a transcript and submitting it
    pub submit_delay: Duration,
    /// Recreate the recognition handle every N fields (0 disables)
    pub refresh_every_fields: usize,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Config::default().timings()
    }
}

impl Config {
    /// Load config from a file, falling back to defaults when missing or corrupt
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                // Keep the corrupt file around for debugging
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn timings(&self) -> SessionTimings {
        SessionTimings {
            max_retries: self.max_retries,
            silence: Duration::from_millis(self.silence_ms),
            listen_timeout: Duration::from_millis(self.listen_timeout_ms),
            post_speech_delay: Duration::from_millis(self.post_speech_delay_ms),
            submit_delay: Duration::from_millis(self.submit_delay_ms),
            refresh_every_fields: self.refresh_every_fields,
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voicefill")
        .join("config.json")
}
