//! Text-to-speech port used by the narrate button.

use std::sync::Arc;

use parking_lot::Mutex;

/// Speech engine provided by the host.
pub trait Narrator {
    /// Hosts without speech support report `false`; narration is then a no-op.
    fn is_available(&self) -> bool {
        true
    }

    fn is_speaking(&self) -> bool;

    fn speak(&mut self, text: &str, language: &str);

    /// Stops any ongoing speech. Cancelling while silent is harmless.
    fn cancel(&mut self);
}

/// Outcome of pressing the narrate button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationToggle {
    Started,
    Stopped,
    Unavailable,
}

/// Speaks `text` unless something is already being spoken, in which case
/// the speech is cancelled instead.
pub fn toggle(narrator: &mut dyn Narrator, text: &str, language: &str) -> NarrationToggle {
    if !narrator.is_available() {
        return NarrationToggle::Unavailable;
    }
    if narrator.is_speaking() {
        narrator.cancel();
        NarrationToggle::Stopped
    } else {
        narrator.speak(text, language);
        NarrationToggle::Started
    }
}

/// Narrator for hosts without speech output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNarrator;

impl Narrator for NullNarrator {
    fn is_available(&self) -> bool {
        false
    }

    fn is_speaking(&self) -> bool {
        false
    }

    fn speak(&mut self, _text: &str, _language: &str) {}

    fn cancel(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub language: String,
}

#[derive(Debug, Default)]
struct NarrationLog {
    current: Option<Utterance>,
    spoken: Vec<Utterance>,
    cancels: usize,
}

/// Narrator that records what it was asked to say. Clones share the same
/// log, so one handle can be given to the interaction core and another kept
/// for inspection. Speech "lasts" until cancelled or [`finish`](Self::finish)ed.
#[derive(Debug, Default, Clone)]
pub struct RecordingNarrator {
    log: Arc<Mutex<NarrationLog>>,
}

impl RecordingNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything spoken so far, oldest first.
    pub fn spoken(&self) -> Vec<Utterance> {
        self.log.lock().spoken.clone()
    }

    pub fn cancels(&self) -> usize {
        self.log.lock().cancels
    }

    /// Marks the current utterance as finished.
    pub fn finish(&self) {
        self.log.lock().current = None;
    }
}

impl Narrator for RecordingNarrator {
    fn is_speaking(&self) -> bool {
        self.log.lock().current.is_some()
    }

    fn speak(&mut self, text: &str, language: &str) {
        let utterance = Utterance {
            text: text.to_string(),
            language: language.to_string(),
        };
        let mut log = self.log.lock();
        log.spoken.push(utterance.clone());
        log.current = Some(utterance);
    }

    fn cancel(&mut self) {
        let mut log = self.log.lock();
        log.current = None;
        log.cancels += 1;
    }
}
