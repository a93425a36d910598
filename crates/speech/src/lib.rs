//! Outbound speech: the sink contract and its queueing semantics.
//!
//! The actual text-to-speech backend lives outside the engine. This crate
//! defines the boundary it must satisfy: utterances carry a queue mode
//! (flush interrupts and clears pending speech, queue appends) and a small
//! immutable property set. Two sinks ship with the engine: `LogSink` routes
//! utterances to the log (the production default when no TTS engine is
//! attached) and `CaptureSink` records everything for tests.

use log::info;

/// Whether an utterance interrupts pending speech or appends to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueMode {
    /// Interrupt: clear anything pending, speak now.
    #[default]
    Flush,
    /// Append after pending utterances.
    Queue,
}

/// Per-utterance properties. Constructed fully populated; never mutated
/// after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeechProps {
    /// Spoken as meta-information (e.g. "entered dialog", error phrases):
    /// backends typically render annotations with a distinct voice pitch.
    pub annotation: bool,
    /// One-shot relative rate multiplier for this utterance only.
    pub relative_rate: Option<f32>,
}

impl SpeechProps {
    pub const fn annotation() -> Self {
        Self {
            annotation: true,
            relative_rate: None,
        }
    }
}

/// A single speech request.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub mode: QueueMode,
    pub props: SpeechProps,
}

impl Utterance {
    pub fn new(text: impl Into<String>, mode: QueueMode) -> Self {
        Self {
            text: text.into(),
            mode,
            props: SpeechProps::default(),
        }
    }

    pub fn annotated(text: impl Into<String>, mode: QueueMode) -> Self {
        Self {
            text: text.into(),
            mode,
            props: SpeechProps::annotation(),
        }
    }
}

/// The sink every spoken phrase flows through.
pub trait SpeechSink {
    fn speak(&mut self, utterance: Utterance);

    /// Stop all speech and clear anything pending.
    fn stop(&mut self);

    /// Whether the backend is still rendering queued speech.
    fn is_speaking(&self) -> bool;
}

/// Global TTS voice settings, adjusted by user commands in relative steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TtsSettings {
    /// Speaking rate multiplier.
    pub rate: f32,
    /// Voice pitch, 0..=1.
    pub pitch: f32,
    /// Output volume, 0..=1.
    pub volume: f32,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 0.5,
            volume: 1.0,
        }
    }
}

/// A settable voice property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProperty {
    Rate,
    Pitch,
    Volume,
}

impl TtsSettings {
    /// Step one property up or down by 10%, clamped to its legal range.
    /// Returns the new value for announcement.
    pub fn adjust(&mut self, property: TtsProperty, increase: bool) -> f32 {
        let step = if increase { 1.1 } else { 1.0 / 1.1 };
        match property {
            TtsProperty::Rate => {
                self.rate = (self.rate * step).clamp(0.2, 5.0);
                self.rate
            }
            TtsProperty::Pitch => {
                self.pitch = (self.pitch * step).clamp(0.0, 1.0);
                self.pitch
            }
            TtsProperty::Volume => {
                self.volume = (self.volume * step).clamp(0.0, 1.0);
                self.volume
            }
        }
    }
}

impl TtsProperty {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rate => "rate",
            Self::Pitch => "pitch",
            Self::Volume => "volume",
        }
    }
}

/// Production default when no TTS engine is attached: speech goes to the
/// log so a headless session is still observable.
#[derive(Debug, Default)]
pub struct LogSink;

impl SpeechSink for LogSink {
    fn speak(&mut self, utterance: Utterance) {
        let mode = match utterance.mode {
            QueueMode::Flush => "flush",
            QueueMode::Queue => "queue",
        };
        if utterance.props.annotation {
            info!("speak[{mode}] (annotation): {}", utterance.text);
        } else {
            info!("speak[{mode}]: {}", utterance.text);
        }
    }

    fn stop(&mut self) {
        info!("speech stopped");
    }

    fn is_speaking(&self) -> bool {
        false
    }
}

/// Test sink: records every utterance, models flush clobbering, and keeps
/// the clobbered utterances around so tests can assert turn-taking.
#[derive(Debug, Default)]
pub struct CaptureSink {
    /// Everything ever requested, in arrival order.
    pub spoken: Vec<Utterance>,
    /// The simulated pending queue after flush semantics are applied.
    pub pending: Vec<Utterance>,
    /// Utterances that a later flush removed before they "played".
    pub clobbered: Vec<Utterance>,
    pub stop_count: usize,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts of all requested utterances, for compact assertions.
    pub fn texts(&self) -> Vec<&str> {
        self.spoken.iter().map(|utterance| utterance.text.as_str()).collect()
    }

    pub fn last_text(&self) -> Option<&str> {
        self.spoken.last().map(|utterance| utterance.text.as_str())
    }

    pub fn clear(&mut self) {
        self.spoken.clear();
        self.pending.clear();
        self.clobbered.clear();
    }
}

impl SpeechSink for CaptureSink {
    fn speak(&mut self, utterance: Utterance) {
        if utterance.mode == QueueMode::Flush {
            self.clobbered.append(&mut self.pending);
        }
        self.pending.push(utterance.clone());
        self.spoken.push(utterance);
    }

    fn stop(&mut self) {
        self.stop_count += 1;
        self.clobbered.append(&mut self.pending);
    }

    fn is_speaking(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Cloneable handle over a [`CaptureSink`], for tests that need to inspect
/// speech output after handing ownership of the sink to a session.
#[derive(Debug, Clone, Default)]
pub struct SharedCapture(Arc<Mutex<CaptureSink>>);

use std::sync::{Arc, Mutex, MutexGuard};

impl SharedCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, CaptureSink> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn texts(&self) -> Vec<String> {
        self.inner()
            .spoken
            .iter()
            .map(|utterance| utterance.text.clone())
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.inner().spoken.last().map(|utterance| utterance.text.clone())
    }

    pub fn utterances(&self) -> Vec<Utterance> {
        self.inner().spoken.clone()
    }

    pub fn clobbered(&self) -> Vec<Utterance> {
        self.inner().clobbered.clone()
    }

    pub fn stop_count(&self) -> usize {
        self.inner().stop_count
    }

    pub fn is_empty(&self) -> bool {
        self.inner().spoken.is_empty()
    }

    pub fn clear(&self) {
        self.inner().clear();
    }
}

impl SpeechSink for SharedCapture {
    fn speak(&mut self, utterance: Utterance) {
        self.inner().speak(utterance);
    }

    fn stop(&mut self) {
        self.inner().stop();
    }

    fn is_speaking(&self) -> bool {
        self.inner().is_speaking()
    }
}
