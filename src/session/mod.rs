//! Voice form-filling session
//!
//! The [`SessionController`] is a pure state machine: it consumes
//! [`SessionEvent`]s and returns [`Action`]s. The [`runtime`] executes those
//! actions on a single tokio task, turning timers, recognition callbacks and
//! speech completion back into events. Every asynchronous event carries the
//! generation it was issued under; the controller drops stale ones.

pub mod controller;
pub mod runtime;
pub mod state;

use crate::asr::RecognitionEvent;
use crate::i18n::{fill, Catalog, StatusKey};
use std::time::Duration;

pub use controller::SessionController;
pub use runtime::{SessionHandle, VoiceAssistant};
pub use state::{AfterSpeech, CollectedData, Phase, SessionState};

/// Timers owned by a session; at most one of each kind is armed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Ends an utterance after quiet following a finalized segment
    Silence,
    /// Hard bound on one listening attempt
    ListenTimeout,
    /// Settle delay between freezing a transcript and submitting it
    Submit,
}

/// Inputs to the state machine that arrive asynchronously
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A prompt finished (including the post-speech guard delay)
    SpeechFinished { generation: u64 },
    Recognition {
        generation: u64,
        event: RecognitionEvent,
    },
    /// `seq` identifies the arming; a re-armed timer gets a new one
    TimerFired {
        timer: TimerKind,
        generation: u64,
        seq: u64,
    },
    Stop,
    Reset,
}

/// Side effects requested by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Speak { text: String, generation: u64 },
    CancelSpeech,
    StartRecognition { generation: u64, refresh: bool },
    AbortRecognition,
    ArmTimer {
        timer: TimerKind,
        generation: u64,
        seq: u64,
        after: Duration,
    },
    CancelTimer(TimerKind),
    Notify(SessionUpdate),
}

/// Phase shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKind {
    Ready,
    Speaking,
    Listening,
    NoSpeechRetry { attempt: u32, max: u32 },
    NotUnderstoodRetry { attempt: u32, max: u32 },
    RecognitionError(String),
    Complete,
    Stopped,
}

impl StatusKind {
    pub fn key(&self) -> StatusKey {
        match self {
            StatusKind::Ready => StatusKey::Ready,
            StatusKind::Speaking => StatusKey::Speaking,
            StatusKind::Listening => StatusKey::Listening,
            StatusKind::NoSpeechRetry { .. } => StatusKey::NoSpeechRetry,
            StatusKind::NotUnderstoodRetry { .. } => StatusKey::NotUnderstoodRetry,
            StatusKind::RecognitionError(_) => StatusKey::RecognitionError,
            StatusKind::Complete => StatusKey::Complete,
            StatusKind::Stopped => StatusKey::Stopped,
        }
    }

    /// Status line in the catalog's language
    pub fn text(&self, catalog: &Catalog) -> String {
        let params = match self {
            StatusKind::NoSpeechRetry { attempt, max }
            | StatusKind::NotUnderstoodRetry { attempt, max } => {
                vec![("attempt", attempt.to_string()), ("max", max.to_string())]
            }
            StatusKind::RecognitionError(code) => vec![("code", code.clone())],
            _ => Vec::new(),
        };
        fill(catalog.status(self.key()), &params)
    }
}

/// Updates delivered to the host form
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Status(StatusKind),
    /// Live transcript of the current attempt (finalized + interim)
    Interim(String),
    /// Fields processed (filled or skipped) out of the total
    Progress { processed: usize, total: usize },
    /// Acceptable values for the field being asked
    Guidance(String),
    /// Running tally after each accepted value
    Collected(CollectedData),
    /// Final data, sent once when a session completes
    Finished(CollectedData),
    /// Session-level failure
    Error(String),
}
