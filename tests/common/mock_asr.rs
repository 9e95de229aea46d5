//! Mock speech recognizer for testing
//!
//! Replays one scripted answer per listening attempt and records what the
//! session asked of it.

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use voicefill::asr::script::ScriptStep;
use voicefill::asr::{RecognitionEvent, RecognitionSink, RecognizerFactory, SpeechRecognizer};

/// Shared record of every handle the factory created
#[derive(Debug, Clone, Default)]
pub struct RecognizerLog {
    /// Language tag of every start attempt, including refused ones
    pub attempts: Arc<Mutex<Vec<String>>>,
    /// Handles created, including the first
    pub created: Arc<AtomicUsize>,
    pub aborts: Arc<AtomicUsize>,
}

impl RecognizerLog {
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

pub struct MockRecognizer {
    steps: Arc<Mutex<VecDeque<ScriptStep>>>,
    reject: Vec<String>,
    log: RecognizerLog,
}

impl SpeechRecognizer for MockRecognizer {
    fn start(&mut self, language: &str, sink: RecognitionSink) -> Result<()> {
        self.log.attempts.lock().unwrap().push(language.to_string());
        if self.reject.iter().any(|l| l == language) {
            return Err(anyhow::anyhow!("language {} not available", language));
        }

        sink.send(RecognitionEvent::Started);
        if let Some(ScriptStep::Events(events)) = self.steps.lock().unwrap().pop_front() {
            for event in events {
                sink.send(event);
            }
        }
        Ok(())
    }

    fn abort(&mut self) {
        self.log.aborts.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Factory over script lines (see `ScriptStep::parse`)
pub fn mock_factory(answers: &[&str], reject: &[&str]) -> (RecognizerFactory, RecognizerLog) {
    let steps: VecDeque<ScriptStep> = answers.iter().filter_map(|a| ScriptStep::parse(a)).collect();
    let steps = Arc::new(Mutex::new(steps));
    let reject: Vec<String> = reject.iter().map(|s| s.to_string()).collect();
    let log = RecognizerLog::default();

    let factory_log = log.clone();
    let factory: RecognizerFactory = Arc::new(move || {
        factory_log.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockRecognizer {
            steps: steps.clone(),
            reject: reject.clone(),
            log: factory_log.clone(),
        }) as Box<dyn SpeechRecognizer>)
    });
    (factory, log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_recognizer_replays_answers() {
        let (factory, log) = mock_factory(&["seventy five"], &["te-IN"]);
        let mut rec = factory().unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        assert!(rec.start("te-IN", RecognitionSink::new(1, tx.clone())).is_err());
        rec.start("en-US", RecognitionSink::new(1, tx)).unwrap();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert_eq!(log.attempts(), vec!["te-IN".to_string(), "en-US".to_string()]);
        assert_eq!(log.created(), 1);
    }
}
