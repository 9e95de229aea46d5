//! Recognition handle management
//!
//! The driver exclusively owns the recognizer handle for a session. It
//! recreates the handle on request and falls back to the default locale
//! when a listening attempt cannot start in the active one.

use super::{RecognitionSink, RecognizerFactory, SpeechRecognizer};
use crate::error::{VoiceFillError, VoiceFillResult};
use crate::i18n::Locale;
use anyhow::Result;
use tracing::{debug, info, warn};

pub struct RecognitionDriver {
    factory: RecognizerFactory,
    handle: Option<Box<dyn SpeechRecognizer>>,
    locale: Locale,
    refreshes: usize,
}

impl RecognitionDriver {
    /// Create the driver and its first handle.
    ///
    /// Fails with `UnsupportedPlatform` when no handle can be created.
    pub fn new(factory: RecognizerFactory, locale: Locale) -> VoiceFillResult<Self> {
        let handle = factory().map_err(|e| VoiceFillError::UnsupportedPlatform(e.to_string()))?;
        info!("🎙️ Recognizer '{}' ready ({})", handle.name(), locale.speech_tag());
        Ok(Self {
            factory,
            handle: Some(handle),
            locale,
            refreshes: 0,
        })
    }

    /// Tear down the current handle and build a new one
    fn recreate(&mut self) -> Result<()> {
        if let Some(mut old) = self.handle.take() {
            old.abort();
        }
        let handle = (self.factory)()?;
        self.refreshes += 1;
        info!("♻️ Recreated recognizer '{}' ({} refreshes)", handle.name(), self.refreshes);
        self.handle = Some(handle);
        Ok(())
    }

    /// Start one listening attempt
    pub fn start(&mut self, sink: RecognitionSink, refresh: bool) -> Result<()> {
        if refresh || self.handle.is_none() {
            self.recreate()?;
        }

        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("no recognizer handle"))?;

        let tag = self.locale.speech_tag();
        debug!("Starting attempt {} in {}", sink.generation(), tag);
        match handle.start(tag, sink.clone()) {
            Ok(()) => Ok(()),
            Err(e) if !self.locale.is_default() => {
                let fallback = Locale::DEFAULT.speech_tag();
                warn!(
                    "⚠️ Could not start recognition in {} ({}), retrying in {}",
                    tag, e, fallback
                );
                handle.abort();
                handle.start(fallback, sink)
            }
            Err(e) => Err(e),
        }
    }

    /// Abort the in-flight attempt, if any
    pub fn abort(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.abort();
        }
    }
}

impl Drop for RecognitionDriver {
    fn drop(&mut self) {
        self.abort();
    }
}
