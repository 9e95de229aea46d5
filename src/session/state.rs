//! Session state owned by the controller

use std::collections::BTreeMap;

/// Collected values keyed by field name
pub type CollectedData = BTreeMap<String, String>;

/// What happens once the current prompt has been spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSpeech {
    Listen,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Speaking(AfterSpeech),
    Listening,
    /// Transcript frozen, waiting for the settle delay
    Submitting,
    Finished,
    Stopped,
}

/// Mutable dialogue state. `field_index` never exceeds the field count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub active: bool,
    pub field_index: usize,
    pub collected: CollectedData,
    pub retry_count: u32,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_everything() {
        let mut state = SessionState {
            active: true,
            field_index: 2,
            retry_count: 1,
            ..SessionState::new()
        };
        state.collected.insert("age".into(), "75".into());

        state.reset();
        assert_eq!(state, SessionState::new());
        assert!(!state.active);
    }
}
