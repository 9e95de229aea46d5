//! ASR (Automatic Speech Recognition) Module
//!
//! Wraps a continuous speech-to-text capability for the dialogue:
//! - [`SpeechRecognizer`]: the platform handle (console, scripted, ...)
//! - [`RecognitionSink`]: event channel tagged with the attempt generation
//! - [`TranscriptBuffer`]: finalized segments of one listening attempt
//! - [`RecognitionDriver`]: owns the handle, refreshes it, falls back to the
//!   default locale when starting fails

pub mod console;
pub mod driver;
pub mod script;
pub mod transcript;

use crate::error::{RecognitionErrorKind, VoiceFillError, VoiceFillResult};
use crate::session::SessionEvent;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

// Re-export main types
pub use console::ConsoleRecognizer;
pub use driver::RecognitionDriver;
pub use script::ScriptedRecognizer;
pub use transcript::TranscriptBuffer;

/// Events a recognizer reports for one listening attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Started,
    /// Recognized text; interim results may still be revised
    Segment { text: String, is_final: bool },
    Error(RecognitionErrorKind),
    /// The platform stopped listening on its own
    Ended,
}

/// Delivers recognition events for one attempt into the session queue
#[derive(Debug, Clone)]
pub struct RecognitionSink {
    generation: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl RecognitionSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false once the session loop has gone away
    pub fn send(&self, event: RecognitionEvent) -> bool {
        self.tx
            .send(SessionEvent::Recognition {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    pub fn error(&self, kind: RecognitionErrorKind) -> bool {
        self.send(RecognitionEvent::Error(kind))
    }
}

/// Trait for continuous speech recognizers
pub trait SpeechRecognizer: Send {
    /// Begin a listening attempt in `language` (e.g. "te-IN").
    /// Events for the attempt go to `sink` until [`abort`](Self::abort).
    fn start(&mut self, language: &str, sink: RecognitionSink) -> Result<()>;

    /// Stop the current attempt; no further events may be sent for it
    fn abort(&mut self);

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Creates fresh recognizer handles; called again on every refresh
pub type RecognizerFactory = Arc<dyn Fn() -> Result<Box<dyn SpeechRecognizer>> + Send + Sync>;

/// Factory to create the configured recognizer
pub fn create_factory(name: &str, script: Option<&Path>) -> VoiceFillResult<RecognizerFactory> {
    info!("🛠️ Creating recognizer: {}", name);
    match name {
        "console" => {
            let input = console::ConsoleInput::spawn();
            Ok(Arc::new(move || {
                Ok(Box::new(ConsoleRecognizer::new(input.clone())) as Box<dyn SpeechRecognizer>)
            }))
        }
        "script" => {
            let path = script.ok_or_else(|| {
                VoiceFillError::Config("the script recognizer needs a script file".to_string())
            })?;
            let steps = script::load_script(path)?;
            Ok(Arc::new(move || {
                Ok(Box::new(ScriptedRecognizer::new(steps.clone())) as Box<dyn SpeechRecognizer>)
            }))
        }
        other => Err(VoiceFillError::UnsupportedPlatform(format!(
            "no speech recognizer named '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_tags_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = RecognitionSink::new(7, tx);
        assert!(sink.send(RecognitionEvent::Segment {
            text: "seventy two".into(),
            is_final: true,
        }));

        match rx.try_recv().unwrap() {
            SessionEvent::Recognition { generation, event } => {
                assert_eq!(generation, 7);
                assert_eq!(
                    event,
                    RecognitionEvent::Segment {
                        text: "seventy two".into(),
                        is_final: true
                    }
                );
            }
            other => panic!("unexpected event {:?}", other),
        }

        drop(rx);
        assert!(!sink.send(RecognitionEvent::Ended));
    }

    #[test]
    fn test_unknown_recognizer_is_unsupported() {
        let err = create_factory("vosk", None).err().unwrap();
        assert!(matches!(err, VoiceFillError::UnsupportedPlatform(_)));
    }

    #[test]
    fn test_script_recognizer_requires_file() {
        let err = create_factory("script", None).err().unwrap();
        assert!(matches!(err, VoiceFillError::Config(_)));
    }
}
