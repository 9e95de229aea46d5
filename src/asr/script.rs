//! Scripted recognizer
//!
//! Replays one scripted outcome per listening attempt. Script lines:
//! - `text`: a finalized segment
//! - `~text`: interim text only (never submitted)
//! - `!code`: a recognition error such as `!no-speech`
//! - `-`: silence (nothing is reported; the attempt times out)
//!
//! Segments separated by ` | ` on one line arrive as separate finalized
//! segments of the same attempt. Lines starting with `#` are comments.

use super::console::parse_line;
use super::{RecognitionEvent, RecognitionSink, SpeechRecognizer};
use crate::error::VoiceFillResult;
use anyhow::Result;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// What the recognizer reports for one attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Events(Vec<RecognitionEvent>),
    Silence,
}

impl ScriptStep {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        if line == "-" {
            return Some(Self::Silence);
        }
        let events: Vec<RecognitionEvent> = line.split(" | ").filter_map(parse_line).collect();
        Some(Self::Events(events))
    }
}

/// Remaining steps, shared by every handle the factory creates
pub type ScriptSteps = Arc<Mutex<VecDeque<ScriptStep>>>;

pub fn parse_script(content: &str) -> ScriptSteps {
    let steps: VecDeque<ScriptStep> = content.lines().filter_map(ScriptStep::parse).collect();
    Arc::new(Mutex::new(steps))
}

pub fn load_script(path: &Path) -> VoiceFillResult<ScriptSteps> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_script(&content))
}

#[derive(Debug)]
pub struct ScriptedRecognizer {
    steps: ScriptSteps,
}

impl ScriptedRecognizer {
    pub fn new(steps: ScriptSteps) -> Self {
        Self { steps }
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn start(&mut self, language: &str, sink: RecognitionSink) -> Result<()> {
        let step = self
            .steps
            .lock()
            .map_err(|e| anyhow::anyhow!("script lock poisoned: {}", e))?
            .pop_front();

        sink.send(RecognitionEvent::Started);
        match step {
            Some(ScriptStep::Events(events)) => {
                debug!("Script ({}) replays {} events", language, events.len());
                for event in events {
                    sink.send(event);
                }
            }
            Some(ScriptStep::Silence) => debug!("Script ({}) stays silent", language),
            None => debug!("Script exhausted"),
        }
        Ok(())
    }

    fn abort(&mut self) {}

    fn name(&self) -> &str {
        "script"
    }
}
