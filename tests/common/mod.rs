//! Scripted engine and callback recorder shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use emerald_speech::{EngineEvent, SpeechCallbacks, SpeechEngine, Utterance, UtteranceId, Voice};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory engine whose behaviour each test scripts through its fields.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    pub voices: Vec<Voice>,
    /// When set, `voices()` fails with this message.
    pub voice_error: Option<String>,
    /// When set, `speak()` fails with this message.
    pub speak_error: Option<String>,
    /// When true, a submitted utterance makes `is_speaking()` report true.
    pub starts_speaking: bool,
    pub speaking: bool,
    pub spoken: Vec<Utterance>,
    /// Operation log: "cancel", "voices", "speak".
    pub calls: Vec<&'static str>,
    pub events: VecDeque<EngineEvent>,
}

impl ScriptedEngine {
    pub fn with_voices(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            ..Default::default()
        }
    }

    pub fn last_id(&self) -> UtteranceId {
        self.spoken.last().expect("nothing was spoken").id
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl SpeechEngine for ScriptedEngine {
    fn cancel(&mut self) {
        self.calls.push("cancel");
        self.speaking = false;
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(ref err) = self.speak_error {
            return Err(err.clone().into());
        }
        self.calls.push("speak");
        self.speaking = self.starts_speaking;
        self.spoken.push(utterance);
        Ok(())
    }

    fn is_speaking(&mut self) -> bool {
        self.speaking
    }

    fn voices(&mut self) -> Result<Vec<Voice>, Box<dyn std::error::Error>> {
        self.calls.push("voices");
        match self.voice_error {
            Some(ref err) => Err(err.clone().into()),
            None => Ok(self.voices.clone()),
        }
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        self.events.pop_front()
    }
}

/// Records every callback invocation as a `label:kind[:detail]` string.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn callbacks(&self, label: &str) -> SpeechCallbacks {
        let (start, end, error) = (self.log.clone(), self.log.clone(), self.log.clone());
        let (l1, l2, l3) = (label.to_string(), label.to_string(), label.to_string());
        SpeechCallbacks::new()
            .on_start(move || start.borrow_mut().push(format!("{l1}:start")))
            .on_end(move |outcome| end.borrow_mut().push(format!("{l2}:end:{outcome:?}")))
            .on_error(move |err| error.borrow_mut().push(format!("{l3}:error:{err:?}")))
    }

    /// Like [`Recorder::callbacks`], also logging `label:cancel`.
    pub fn callbacks_with_cancel(&self, label: &str) -> SpeechCallbacks {
        let log = self.log.clone();
        let label = label.to_string();
        self.callbacks(&label)
            .on_cancel(move || log.borrow_mut().push(format!("{label}:cancel")))
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

pub fn mandarin_voice() -> Voice {
    Voice::new("zh-CN", "Ting-Ting", true)
}
