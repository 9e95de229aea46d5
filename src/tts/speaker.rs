//! Sequenced speech output
//!
//! Speaks one prompt at a time and reports completion to the session only
//! after the post-speech guard delay, so listening never overlaps with the
//! tail of the assistant's own voice.

use super::{TtsEngine, VoiceParams};
use crate::session::SessionEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Wait before listening when there is no speech output at all
pub const NO_ENGINE_DELAY: Duration = Duration::from_millis(300);

pub struct Speaker {
    engine: Option<Arc<dyn TtsEngine>>,
    voice: VoiceParams,
    post_delay: Duration,
    current: Option<JoinHandle<()>>,
}

impl Speaker {
    pub fn new(
        engine: Option<Arc<dyn TtsEngine>>,
        voice: VoiceParams,
        post_delay: Duration,
    ) -> Self {
        Self {
            engine,
            voice,
            post_delay,
            current: None,
        }
    }

    /// Speak `text`, then send `SpeechFinished` for `generation`.
    /// Any utterance still in progress is cancelled first.
    pub fn speak(
        &mut self,
        text: String,
        generation: u64,
        tx: mpsc::UnboundedSender<SessionEvent>,
    ) {
        self.cancel();

        let engine = self.engine.clone();
        let voice = self.voice.clone();
        let post_delay = self.post_delay;

        self.current = Some(tokio::spawn(async move {
            match engine {
                Some(engine) => {
                    if let Err(e) = engine.speak(&text, &voice).await {
                        // Listening still has to resume after a failed prompt
                        warn!("⚠️ Speech synthesis error ({}): {}", engine.name(), e);
                    }
                    tokio::time::sleep(post_delay).await;
                }
                None => tokio::time::sleep(NO_ENGINE_DELAY).await,
            }
            debug!("Prompt {} finished", generation);
            let _ = tx.send(SessionEvent::SpeechFinished { generation });
        }));
    }

    /// Cut off the current utterance; its completion is never reported
    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.abort();
        }
    }
}

impl Drop for Speaker {
    fn drop(&mut self) {
        self.cancel();
    }
}
