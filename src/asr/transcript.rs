//! Transcript accumulation for one listening attempt

/// Finalized segments of the current attempt plus the latest interim text.
/// Only finalized text is ever submitted for extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptBuffer {
    finals: String,
    interim: String,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized segment; clears the interim text it supersedes
    pub fn push_final(&mut self, segment: &str) {
        let segment = segment.trim();
        if !segment.is_empty() {
            if !self.finals.is_empty() {
                self.finals.push(' ');
            }
            self.finals.push_str(segment);
        }
        self.interim.clear();
    }

    pub fn set_interim(&mut self, text: &str) {
        self.interim = text.trim().to_string();
    }

    pub fn is_empty(&self) -> bool {
        self.finals.is_empty()
    }

    /// Finalized plus interim text, for live display
    pub fn display(&self) -> String {
        format!("{} {}", self.finals, self.interim).trim().to_string()
    }

    /// Freeze the finalized text and empty the buffer
    pub fn take(&mut self) -> String {
        let text = std::mem::take(&mut self.finals);
        self.interim.clear();
        text
    }
}
