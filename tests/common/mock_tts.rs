//! Mock TTS Engine for Testing
//!
//! Records all spoken text for verification.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use voicefill::tts::{TtsEngine, VoiceParams};

/// Mock TTS engine that records spoken text and voices
#[derive(Debug, Default)]
pub struct MockTts {
    spoken: Mutex<Vec<(String, VoiceParams)>>,
    /// Fail every utterance (after recording it)
    pub should_fail: AtomicBool,
}

impl MockTts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let mock = Self::new();
        mock.should_fail.store(true, Ordering::SeqCst);
        mock
    }

    /// Get all spoken phrases
    pub fn get_spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn voices(&self) -> Vec<VoiceParams> {
        self.spoken.lock().unwrap().iter().map(|(_, v)| v.clone()).collect()
    }

    /// Check if a phrase was spoken
    pub fn was_spoken(&self, text: &str) -> bool {
        self.spoken.lock().unwrap().iter().any(|(s, _)| s.contains(text))
    }

    pub fn count_spoken(&self, text: &str) -> usize {
        self.spoken.lock().unwrap().iter().filter(|(s, _)| s.contains(text)).count()
    }
}

#[async_trait]
impl TtsEngine for MockTts {
    async fn speak(&self, text: &str, voice: &VoiceParams) -> Result<()> {
        self.spoken.lock().unwrap().push((text.to_string(), voice.clone()));
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Mock TTS failure"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_tts_records_speech() {
        let mock = MockTts::new();
        mock.speak("hello", &VoiceParams::default()).await.unwrap();
        mock.speak("world", &VoiceParams::default()).await.unwrap();

        assert!(mock.was_spoken("hello"));
        assert!(mock.was_spoken("world"));
        assert_eq!(mock.get_spoken().len(), 2);
    }
}
