//! Session runtime
//!
//! Runs a [`SessionController`] on one tokio task. Host commands, speech
//! completion, recognition callbacks and timer expiry are all serialized
//! through that task, so the controller never sees two events at once.

use super::{Action, SessionController, SessionEvent, SessionUpdate, TimerKind};
use crate::asr::{RecognitionDriver, RecognitionSink, RecognizerFactory};
use crate::audio::MicrophoneAccess;
use crate::config::SessionTimings;
use crate::error::{RecognitionErrorKind, VoiceFillError, VoiceFillResult};
use crate::fields::{self, FieldSpec};
use crate::i18n::Catalog;
use crate::tts::{Speaker, TtsEngine, VoiceParams};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Requests from the host form
#[derive(Debug)]
enum Command {
    Start {
        fields: Vec<FieldSpec>,
        reply: oneshot::Sender<VoiceFillResult<()>>,
    },
    Stop,
    Reset,
    Shutdown,
}

/// Handle to a running assistant
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    fn send(&self, command: Command) -> VoiceFillResult<()> {
        self.commands
            .send(command)
            .map_err(|_| VoiceFillError::Channel("session loop has stopped".to_string()))
    }

    /// Start a session; resolves once the first prompt has been issued
    pub async fn start(&self, fields: Vec<FieldSpec>) -> VoiceFillResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { fields, reply })?;
        rx.await.map_err(|_| {
            VoiceFillError::Channel("session loop dropped the start request".to_string())
        })?
    }

    pub fn stop(&self) -> VoiceFillResult<()> {
        self.send(Command::Stop)
    }

    pub fn reset(&self) -> VoiceFillResult<()> {
        self.send(Command::Reset)
    }

    /// Stop any session and wait for the loop to exit
    pub async fn shutdown(self) -> VoiceFillResult<()> {
        // The loop may already be gone; joining is what matters
        let _ = self.commands.send(Command::Shutdown);
        self.task
            .await
            .map_err(|e| VoiceFillError::Channel(format!("session loop panicked: {}", e)))
    }
}

/// Executes controller actions against the platform adapters
struct Executor {
    controller: SessionController,
    driver: RecognitionDriver,
    speaker: Speaker,
    microphone: Arc<dyn MicrophoneAccess>,
    timers: HashMap<TimerKind, JoinHandle<()>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
}

impl Executor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        info!("🚀 Voice assistant loop running");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Start { fields, reply }) => {
                        let result = self.start(fields).await;
                        if let Err(e) = &result {
                            let _ = self.updates.send(SessionUpdate::Error(e.to_string()));
                        }
                        let _ = reply.send(result);
                    }
                    Some(Command::Stop) => self.dispatch(SessionEvent::Stop),
                    Some(Command::Reset) => self.dispatch(SessionEvent::Reset),
                    Some(Command::Shutdown) | None => {
                        self.dispatch(SessionEvent::Stop);
                        break;
                    }
                },
                Some(event) = events.recv() => self.dispatch(event),
            }
        }
        info!("👋 Voice assistant loop stopped");
    }

    async fn start(&mut self, fields: Vec<FieldSpec>) -> VoiceFillResult<()> {
        if fields.is_empty() {
            return Err(VoiceFillError::NoFields);
        }
        fields::validate(&fields)?;

        self.microphone.request().await.map_err(|e| {
            error!("❌ Microphone access failed ({}): {}", self.microphone.name(), e);
            VoiceFillError::PermissionDenied(e.to_string())
        })?;

        let actions = self.controller.start(fields)?;
        self.apply(actions);
        Ok(())
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let actions = self.controller.handle(event);
        self.apply(actions);
    }

    fn apply(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Speak { text, generation } => {
                    self.speaker.speak(text, generation, self.events.clone());
                }
                Action::CancelSpeech => self.speaker.cancel(),
                Action::StartRecognition {
                    generation,
                    refresh,
                } => {
                    let sink = RecognitionSink::new(generation, self.events.clone());
                    if let Err(e) = self.driver.start(sink.clone(), refresh) {
                        warn!("⚠️ Recognition failed to start: {}", e);
                        sink.error(RecognitionErrorKind::Other("start-failed".to_string()));
                    }
                }
                Action::AbortRecognition => self.driver.abort(),
                Action::ArmTimer {
                    timer,
                    generation,
                    seq,
                    after,
                } => {
                    self.cancel_timer(timer);
                    let events = self.events.clone();
                    let handle = tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = events.send(SessionEvent::TimerFired {
                            timer,
                            generation,
                            seq,
                        });
                    });
                    self.timers.insert(timer, handle);
                }
                Action::CancelTimer(timer) => self.cancel_timer(timer),
                Action::Notify(update) => {
                    if self.updates.send(update).is_err() {
                        debug!("No listener for session updates");
                    }
                }
            }
        }
    }

    fn cancel_timer(&mut self, timer: TimerKind) {
        if let Some(handle) = self.timers.remove(&timer) {
            handle.abort();
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

/// A mounted voice assistant, ready to be spawned onto the runtime
pub struct VoiceAssistant {
    executor: Executor,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl VoiceAssistant {
    /// Mount the assistant.
    ///
    /// Fails with `UnsupportedPlatform` when the recognizer cannot be created.
    pub fn new(
        catalog: Arc<Catalog>,
        timings: SessionTimings,
        speech_rate: f32,
        recognizer: RecognizerFactory,
        tts: Option<Arc<dyn TtsEngine>>,
        microphone: Arc<dyn MicrophoneAccess>,
    ) -> VoiceFillResult<(Self, mpsc::UnboundedReceiver<SessionUpdate>)> {
        let locale = catalog.locale();
        let driver = RecognitionDriver::new(recognizer, locale)?;

        let voice = VoiceParams {
            language: locale.speech_tag().to_string(),
            rate: speech_rate,
        };
        let speaker = Speaker::new(tts, voice, timings.post_speech_delay);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let executor = Executor {
            controller: SessionController::new(catalog, timings),
            driver,
            speaker,
            microphone,
            timers: HashMap::new(),
            events: events_tx,
            updates: updates_tx,
        };

        Ok((
            Self {
                executor,
                events: events_rx,
            },
            updates_rx,
        ))
    }

    /// Run the session loop on the current tokio runtime
    pub fn spawn(self) -> SessionHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let Self { executor, events } = self;
        let task = tokio::spawn(executor.run(commands_rx, events));
        SessionHandle {
            commands: commands_tx,
            task,
        }
    }
}
