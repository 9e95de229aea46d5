#![allow(dead_code)]

pub mod mock_asr;
pub mod mock_tts;

use mock_asr::{mock_factory, RecognizerLog};
use mock_tts::MockTts;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use voicefill::audio::{AssumeGranted, MicrophoneAccess};
use voicefill::config::SessionTimings;
use voicefill::fields::{FieldSpec, SelectOption};
use voicefill::i18n::{Catalog, Locale};
use voicefill::session::{CollectedData, SessionHandle, SessionUpdate, VoiceAssistant};
use voicefill::tts::TtsEngine;

/// A mounted assistant wired to mocks
pub struct TestSession {
    pub session: SessionHandle,
    pub updates: mpsc::UnboundedReceiver<SessionUpdate>,
    pub tts: Arc<MockTts>,
    pub recognizer: RecognizerLog,
}

impl TestSession {
    pub fn new(locale: Locale, answers: &[&str]) -> Self {
        Self::with_options(
            locale,
            answers,
            &[],
            Arc::new(MockTts::new()),
            Arc::new(AssumeGranted),
        )
    }

    /// `reject` lists language tags the recognizer refuses to start in
    pub fn with_options(
        locale: Locale,
        answers: &[&str],
        reject: &[&str],
        tts: Arc<MockTts>,
        microphone: Arc<dyn MicrophoneAccess>,
    ) -> Self {
        let (factory, recognizer) = mock_factory(answers, reject);
        let (assistant, updates) = VoiceAssistant::new(
            Arc::new(Catalog::for_locale(locale)),
            SessionTimings::default(),
            0.95,
            factory,
            Some(tts.clone() as Arc<dyn TtsEngine>),
            microphone,
        )
        .expect("Failed to mount assistant");

        Self {
            session: assistant.spawn(),
            updates,
            tts,
            recognizer,
        }
    }

    /// Collect updates until the session finishes or `limit` of (paused) time passes
    pub async fn wait_finished(
        &mut self,
        limit: Duration,
    ) -> (Option<CollectedData>, Vec<SessionUpdate>) {
        let mut seen = Vec::new();
        let deadline = tokio::time::Instant::now() + limit;
        loop {
            match tokio::time::timeout_at(deadline, self.updates.recv()).await {
                Ok(Some(SessionUpdate::Finished(data))) => return (Some(data), seen),
                Ok(Some(update)) => seen.push(update),
                Ok(None) | Err(_) => return (None, seen),
            }
        }
    }
}

pub fn age() -> FieldSpec {
    FieldSpec::number("age", "Age", 29.0, 77.0)
}

pub fn sex() -> FieldSpec {
    FieldSpec::select(
        "sex",
        "Sex",
        vec![SelectOption::new("0", "Female"), SelectOption::new("1", "Male")],
    )
}
