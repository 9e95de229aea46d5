//! Session Controller
//!
//! Single transition function for the voice form-filling dialogue:
//! `Idle -> Speaking -> Listening -> (next | retry | skip) -> ... -> Finished`,
//! with `Stopped` reachable from any active phase. The controller never
//! blocks or spawns; it returns [`Action`]s for the runtime to execute.

use super::state::{AfterSpeech, CollectedData, Phase, SessionState};
use super::{Action, SessionEvent, SessionUpdate, StatusKind, TimerKind};
use crate::asr::{RecognitionEvent, TranscriptBuffer};
use crate::config::SessionTimings;
use crate::core::{PromptGenerator, ValueExtractor};
use crate::error::{RecognitionErrorKind, VoiceFillError, VoiceFillResult};
use crate::fields::FieldSpec;
use crate::i18n::Catalog;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

const ALL_TIMERS: [TimerKind; 3] = [
    TimerKind::Silence,
    TimerKind::ListenTimeout,
    TimerKind::Submit,
];

pub struct SessionController {
    fields: Vec<FieldSpec>,
    state: SessionState,
    phase: Phase,
    /// Bumped for every prompt and on stop; async events must match it
    generation: u64,
    /// Present exactly while a listening attempt is live
    transcript: Option<TranscriptBuffer>,
    /// Frozen transcript waiting for the submit timer
    pending: Option<String>,
    /// Sequence token of each armed timer
    armed: HashMap<TimerKind, u64>,
    timer_seq: u64,
    refresh_due: bool,
    timings: SessionTimings,
    prompts: PromptGenerator,
    extractor: ValueExtractor,
}

impl SessionController {
    pub fn new(catalog: Arc<Catalog>, timings: SessionTimings) -> Self {
        Self {
            fields: Vec::new(),
            state: SessionState::new(),
            phase: Phase::Idle,
            generation: 0,
            transcript: None,
            pending: None,
            armed: HashMap::new(),
            timer_seq: 0,
            refresh_due: false,
            timings,
            prompts: PromptGenerator::new(catalog.clone()),
            extractor: ValueExtractor::new(catalog),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn collected(&self) -> &CollectedData {
        &self.state.collected
    }

    /// Begin a session over `fields`. The microphone check happens in the
    /// runtime before this is called.
    pub fn start(&mut self, fields: Vec<FieldSpec>) -> VoiceFillResult<Vec<Action>> {
        if fields.is_empty() {
            return Err(VoiceFillError::NoFields);
        }

        let mut actions = self.teardown();
        self.fields = fields;
        self.state.reset();
        self.state.active = true;
        self.refresh_due = false;

        let total = self.fields.len();
        info!("🎬 Voice session started with {} fields", total);

        let first = &self.fields[0];
        let guidance = first.guidance();
        let text = self.prompts.start(first, total);

        actions.push(Action::Notify(SessionUpdate::Collected(CollectedData::new())));
        actions.push(Action::Notify(SessionUpdate::Progress {
            processed: 0,
            total,
        }));
        actions.push(Action::Notify(SessionUpdate::Guidance(guidance)));
        actions.extend(self.speak(text, AfterSpeech::Listen));
        Ok(actions)
    }

    /// Feed one asynchronous event through the state machine
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Action> {
        match event {
            SessionEvent::Stop => self.stop(),
            SessionEvent::Reset => self.reset(),
            _ if !self.state.active => {
                debug!("Session inactive, dropping {:?}", event);
                Vec::new()
            }
            SessionEvent::SpeechFinished { generation } => {
                if generation != self.generation {
                    debug!("Stale speech completion {}", generation);
                    return Vec::new();
                }
                match self.phase {
                    Phase::Speaking(AfterSpeech::Listen) => self.start_listening(),
                    Phase::Speaking(AfterSpeech::Finish) => self.finish(),
                    _ => Vec::new(),
                }
            }
            SessionEvent::Recognition { generation, event } => {
                if generation != self.generation || self.transcript.is_none() {
                    debug!("Stale recognition event {:?} ({})", event, generation);
                    return Vec::new();
                }
                self.on_recognition(event)
            }
            SessionEvent::TimerFired {
                timer,
                generation,
                seq,
            } => {
                if generation != self.generation || self.armed.get(&timer) != Some(&seq) {
                    debug!("Stale {:?} timer ({}/{})", timer, generation, seq);
                    return Vec::new();
                }
                self.armed.remove(&timer);
                self.on_timer(timer)
            }
        }
    }

    /// Run extraction for the current field and move the dialogue on
    pub fn submit_transcript(&mut self, text: &str) -> Vec<Action> {
        if !self.state.active {
            return Vec::new();
        }

        let mut actions = self.teardown();
        let idx = self.state.field_index;
        let total = self.fields.len();
        if idx >= total {
            actions.extend(self.finish());
            return actions;
        }

        match self.extractor.extract(&self.fields[idx], text) {
            Some(value) => {
                let name = self.fields[idx].name.clone();
                info!("✅ {} = {}", name, value);
                self.state.collected.insert(name, value.clone());
                self.state.retry_count = 0;
                self.state.field_index = idx + 1;

                actions.push(Action::Notify(SessionUpdate::Collected(
                    self.state.collected.clone(),
                )));
                actions.push(Action::Notify(SessionUpdate::Progress {
                    processed: idx + 1,
                    total,
                }));

                let next_index = idx + 1;
                if next_index < total {
                    self.schedule_refresh(next_index);
                    let next = &self.fields[next_index];
                    let guidance = next.guidance();
                    let text =
                        self.prompts.next(&self.fields[idx], &value, next, next_index, total);
                    actions.push(Action::Notify(SessionUpdate::Guidance(guidance)));
                    actions.extend(self.speak(text, AfterSpeech::Listen));
                } else {
                    let text = self.prompts.done(&self.fields[idx], &value);
                    actions.extend(self.speak(text, AfterSpeech::Finish));
                }
            }
            None => {
                self.state.retry_count += 1;
                let attempt = self.state.retry_count;
                let max = self.timings.max_retries;
                if attempt > max {
                    actions.extend(self.skip_current_field());
                } else {
                    debug!("Could not extract a value from '{}'", text);
                    let prompt = self.prompts.retry(&self.fields[idx]);
                    actions.push(Action::Notify(SessionUpdate::Status(
                        StatusKind::NotUnderstoodRetry { attempt, max },
                    )));
                    actions.extend(self.speak(prompt, AfterSpeech::Listen));
                }
            }
        }
        actions
    }

    /// Move past the current field without storing a value
    pub fn skip_current_field(&mut self) -> Vec<Action> {
        if !self.state.active {
            return Vec::new();
        }

        let mut actions = self.teardown();
        let idx = self.state.field_index;
        let total = self.fields.len();
        if idx >= total {
            actions.extend(self.finish());
            return actions;
        }

        info!("⏭️ Skipping field '{}'", self.fields[idx].name);
        let next_index = idx + 1;
        self.state.field_index = next_index;
        self.state.retry_count = 0;
        actions.push(Action::Notify(SessionUpdate::Progress {
            processed: next_index,
            total,
        }));

        if next_index < total {
            self.schedule_refresh(next_index);
            let next = &self.fields[next_index];
            let guidance = next.guidance();
            let text = self.prompts.skip(next, next_index, total);
            actions.push(Action::Notify(SessionUpdate::Guidance(guidance)));
            actions.extend(self.speak(text, AfterSpeech::Listen));
        } else {
            let text = self.prompts.skip_done();
            actions.extend(self.speak(text, AfterSpeech::Finish));
        }
        actions
    }

    /// Cancel everything in flight. Safe from any phase, repeatedly.
    pub fn stop(&mut self) -> Vec<Action> {
        let mut actions = self.teardown();
        self.generation += 1;

        if self.state.active {
            info!("⏹️ Voice session stopped");
            self.state.active = false;
            self.phase = Phase::Stopped;
            actions.push(Action::Notify(SessionUpdate::Status(StatusKind::Stopped)));
        }
        actions
    }

    /// Stop, then clear all session state
    pub fn reset(&mut self) -> Vec<Action> {
        let mut actions = self.stop();
        self.state.reset();
        self.phase = Phase::Idle;
        self.refresh_due = false;

        actions.push(Action::Notify(SessionUpdate::Status(StatusKind::Ready)));
        actions.push(Action::Notify(SessionUpdate::Interim(String::new())));
        actions.push(Action::Notify(SessionUpdate::Guidance(String::new())));
        actions.push(Action::Notify(SessionUpdate::Collected(CollectedData::new())));
        actions.push(Action::Notify(SessionUpdate::Progress {
            processed: 0,
            total: 0,
        }));
        actions
    }

    fn finish(&mut self) -> Vec<Action> {
        let mut actions = self.teardown();
        self.generation += 1;
        self.state.active = false;
        self.phase = Phase::Finished;

        info!(
            "🏁 Session finished: {}/{} fields collected",
            self.state.collected.len(),
            self.fields.len()
        );
        actions.push(Action::Notify(SessionUpdate::Status(StatusKind::Complete)));
        actions.push(Action::Notify(SessionUpdate::Finished(
            self.state.collected.clone(),
        )));
        actions
    }

    /// Cancel timers, the recognition attempt and speech in flight
    fn teardown(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        for timer in ALL_TIMERS {
            if self.armed.remove(&timer).is_some() {
                actions.push(Action::CancelTimer(timer));
            }
        }
        if self.transcript.take().is_some() {
            actions.push(Action::AbortRecognition);
        }
        if matches!(self.phase, Phase::Speaking(_)) {
            actions.push(Action::CancelSpeech);
        }
        self.pending = None;
        actions
    }

    fn speak(&mut self, text: String, after: AfterSpeech) -> Vec<Action> {
        let mut actions = self.teardown();
        self.generation += 1;
        self.phase = Phase::Speaking(after);

        debug!("🗣️ Prompt {}: {}", self.generation, text);
        actions.push(Action::Notify(SessionUpdate::Status(StatusKind::Speaking)));
        actions.push(Action::Speak {
            text,
            generation: self.generation,
        });
        actions
    }

    fn start_listening(&mut self) -> Vec<Action> {
        self.phase = Phase::Listening;
        self.transcript = Some(TranscriptBuffer::new());
        let refresh = std::mem::take(&mut self.refresh_due);

        vec![
            Action::StartRecognition {
                generation: self.generation,
                refresh,
            },
            self.arm(TimerKind::ListenTimeout, self.timings.listen_timeout),
            Action::Notify(SessionUpdate::Status(StatusKind::Listening)),
            Action::Notify(SessionUpdate::Interim(String::new())),
        ]
    }

    fn arm(&mut self, timer: TimerKind, after: std::time::Duration) -> Action {
        self.timer_seq += 1;
        self.armed.insert(timer, self.timer_seq);
        Action::ArmTimer {
            timer,
            generation: self.generation,
            seq: self.timer_seq,
            after,
        }
    }

    fn schedule_refresh(&mut self, next_index: usize) {
        let every = self.timings.refresh_every_fields;
        if every > 0 && next_index % every == 0 {
            self.refresh_due = true;
        }
    }

    fn on_recognition(&mut self, event: RecognitionEvent) -> Vec<Action> {
        match event {
            RecognitionEvent::Started => {
                debug!("Recognition started ({})", self.generation);
                Vec::new()
            }
            RecognitionEvent::Segment { text, is_final } => {
                let Some(buffer) = self.transcript.as_mut() else {
                    return Vec::new();
                };
                if is_final {
                    buffer.push_final(&text);
                } else {
                    buffer.set_interim(&text);
                }
                let display = buffer.display();

                let mut actions = Vec::new();
                if is_final {
                    // Each finalized segment restarts the silence window
                    actions.push(self.arm(TimerKind::Silence, self.timings.silence));
                }
                actions.push(Action::Notify(SessionUpdate::Interim(display)));
                actions
            }
            RecognitionEvent::Error(kind) => self.on_recognition_error(kind),
            RecognitionEvent::Ended => {
                if self.has_transcript() {
                    self.freeze_transcript()
                } else {
                    debug!("Recognition ended without speech");
                    self.on_recognition_error(RecognitionErrorKind::NoSpeech)
                }
            }
        }
    }

    fn on_timer(&mut self, timer: TimerKind) -> Vec<Action> {
        match timer {
            TimerKind::Silence => {
                if self.has_transcript() {
                    self.freeze_transcript()
                } else {
                    Vec::new()
                }
            }
            TimerKind::ListenTimeout => {
                if self.has_transcript() {
                    self.freeze_transcript()
                } else {
                    warn!("⏱️ Listening timed out");
                    self.on_recognition_error(RecognitionErrorKind::NoSpeech)
                }
            }
            TimerKind::Submit => {
                let text = self.pending.take().unwrap_or_default();
                self.submit_transcript(&text)
            }
        }
    }

    fn has_transcript(&self) -> bool {
        self.transcript.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// End the attempt and submit its text after the settle delay
    fn freeze_transcript(&mut self) -> Vec<Action> {
        let text = self
            .transcript
            .as_mut()
            .map(TranscriptBuffer::take)
            .unwrap_or_default();
        debug!("Heard: '{}'", text);

        let mut actions = self.teardown();
        self.phase = Phase::Submitting;
        self.pending = Some(text);
        actions.push(self.arm(TimerKind::Submit, self.timings.submit_delay));
        actions
    }

    fn on_recognition_error(&mut self, kind: RecognitionErrorKind) -> Vec<Action> {
        if kind == RecognitionErrorKind::Aborted {
            return Vec::new();
        }

        let mut actions = self.teardown();
        let idx = self.state.field_index;
        if idx >= self.fields.len() {
            actions.extend(self.finish());
            return actions;
        }

        if kind.is_transient() {
            self.state.retry_count += 1;
            let attempt = self.state.retry_count;
            let max = self.timings.max_retries;
            if attempt > max {
                actions.extend(self.skip_current_field());
            } else {
                warn!("⚠️ Recognition {} (retry {}/{})", kind, attempt, max);
                let prompt = self.prompts.no_speech(&self.fields[idx]);
                actions.push(Action::Notify(SessionUpdate::Status(
                    StatusKind::NoSpeechRetry { attempt, max },
                )));
                actions.extend(self.speak(prompt, AfterSpeech::Listen));
            }
        } else {
            warn!("⚠️ Recognition error '{}', skipping field", kind);
            actions.push(Action::Notify(SessionUpdate::Status(
                StatusKind::RecognitionError(kind.code().to_string()),
            )));
            actions.extend(self.skip_current_field());
        }
        actions
    }
}
