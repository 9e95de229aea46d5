//! Console recognizer
//!
//! Treats typed lines on stdin as recognized speech. Plain lines are
//! finalized segments, `~text` is interim text and `!code` reports a
//! recognition error (e.g. `!no-speech`).

use super::{RecognitionEvent, RecognitionSink, SpeechRecognizer};
use crate::error::RecognitionErrorKind;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Parse one typed line into a recognition event
pub fn parse_line(line: &str) -> Option<RecognitionEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(code) = line.strip_prefix('!') {
        return Some(RecognitionEvent::Error(RecognitionErrorKind::from_code(
            code.trim(),
        )));
    }

    if let Some(text) = line.strip_prefix('~') {
        return Some(RecognitionEvent::Segment {
            text: text.trim().to_string(),
            is_final: false,
        });
    }

    Some(RecognitionEvent::Segment {
        text: line.to_string(),
        is_final: true,
    })
}

/// Shared stdin reader; outlives individual recognizer handles
#[derive(Debug, Clone)]
pub struct ConsoleInput {
    current: Arc<Mutex<Option<RecognitionSink>>>,
    closed: Arc<AtomicBool>,
}

impl ConsoleInput {
    /// Start reading stdin on the current tokio runtime
    pub fn spawn() -> Self {
        let input = Self {
            current: Arc::new(Mutex::new(None)),
            closed: Arc::new(AtomicBool::new(false)),
        };

        let reader = input.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => reader.dispatch(&line),
                    Ok(None) => break,
                    Err(e) => {
                        warn!("⚠️ Console input error: {}", e);
                        break;
                    }
                }
            }
            info!("⌨️ Console input closed");
            reader.closed.store(true, Ordering::SeqCst);
            if let Some(sink) = reader.take_sink() {
                sink.send(RecognitionEvent::Ended);
            }
        });

        input
    }

    fn dispatch(&self, line: &str) {
        let Some(event) = parse_line(line) else {
            return;
        };

        let sink = self.current.lock().ok().and_then(|guard| guard.clone());
        match sink {
            Some(sink) => {
                sink.send(event);
            }
            None => debug!("Not listening, ignoring input '{}'", line.trim()),
        }
    }

    fn set_sink(&self, sink: Option<RecognitionSink>) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = sink;
        }
    }

    fn take_sink(&self) -> Option<RecognitionSink> {
        self.current.lock().ok().and_then(|mut guard| guard.take())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Recognizer handle reading from [`ConsoleInput`]
#[derive(Debug)]
pub struct ConsoleRecognizer {
    input: ConsoleInput,
}

impl ConsoleRecognizer {
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn start(&mut self, language: &str, sink: RecognitionSink) -> Result<()> {
        if self.input.is_closed() {
            return Err(anyhow::anyhow!("console input is closed"));
        }
        debug!("Console listening ({})", language);
        sink.send(RecognitionEvent::Started);
        self.input.set_sink(Some(sink));
        Ok(())
    }

    fn abort(&mut self) {
        self.input.set_sink(None);
    }

    fn name(&self) -> &str {
        "console"
    }
}

impl Drop for ConsoleRecognizer {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   "), None);
        assert_eq!(
            parse_line("seventy five"),
            Some(RecognitionEvent::Segment {
                text: "seventy five".into(),
                is_final: true
            })
        );
        assert_eq!(
            parse_line("~seven"),
            Some(RecognitionEvent::Segment {
                text: "seven".into(),
                is_final: false
            })
        );
        assert_eq!(
            parse_line("!no-speech"),
            Some(RecognitionEvent::Error(RecognitionErrorKind::NoSpeech))
        );
    }
}
