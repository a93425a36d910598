//! Shared session state.
//!
//! One explicit struct owns every piece of state the event router and
//! command dispatch both touch: the document, the navigation cursor, the
//! dialog context, the single live editable tracker, and the speech sink.
//! Exactly one `&mut` borrow flows through the system at a time; the
//! single-threaded host is what makes that sound. A host that introduces
//! real parallelism must funnel all access through a single-writer queue.

use crate::cursor::NavigationCursor;
use crate::dialog::DialogContext;
use describe::NavDescription;
use dom::{Document, Walker};
use editable::EditableTracker;
use log::debug;
use speech::{QueueMode, SpeechSink, TtsSettings, Utterance};

pub struct SessionState {
    pub document: Document,
    pub cursor: NavigationCursor,
    pub dialog: DialogContext,
    /// The 0-or-1 live editable tracker, tied to the focused control.
    pub tracker: Option<EditableTracker>,
    pub walker: Walker,
    pub tts: TtsSettings,
    pub sink: Box<dyn SpeechSink>,
    /// Set by the host while a modal widget owns the keyboard; commands
    /// pass through untouched while it is up.
    pub modal_widget_active: bool,
}

impl SessionState {
    pub fn new(sink: Box<dyn SpeechSink>) -> Self {
        Self {
            document: Document::new(),
            cursor: NavigationCursor::default(),
            dialog: DialogContext::default(),
            tracker: None,
            walker: Walker::new(),
            tts: TtsSettings::default(),
            sink,
            modal_widget_active: false,
        }
    }

    pub fn speak(&mut self, utterance: Utterance) {
        debug!("speak {:?}: {}", utterance.mode, utterance.text);
        self.sink.speak(utterance);
    }

    pub fn speak_description(&mut self, description: &NavDescription, mode: QueueMode) {
        for utterance in description.to_utterances(mode) {
            self.speak(utterance);
        }
    }

    pub fn stop_speech(&mut self) {
        self.sink.stop();
    }

    /// Whether focus currently sits in a tracked text control.
    pub fn text_control_focused(&self) -> bool {
        self.tracker.is_some()
    }
}
