//! The read-aloud button shown next to each task.
//!
//! Clicking swaps the speaker glyph for an hourglass until speech starts or
//! ends; an error reverts the glyph and raises an alert for the page to show.
//! A click that is superseded by another button, or cancelled, reverts too.

use std::cell::RefCell;
use std::rc::Rc;

use crate::manager::{SpeechCallbacks, SpeechManager};
use crate::SpeechEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Glyph {
    #[default]
    Speaker,
    Hourglass,
}

impl Glyph {
    /// The emoji shown on the button.
    pub fn as_str(self) -> &'static str {
        match self {
            Glyph::Speaker => "🔊",
            Glyph::Hourglass => "⏳",
        }
    }
}

#[derive(Debug, Default)]
struct ButtonState {
    glyph: Glyph,
    alert: Option<String>,
}

/// A button bound to one task's text (its `data-text` attribute).
#[derive(Debug)]
pub struct ReadAloudButton {
    text: Option<String>,
    state: Rc<RefCell<ButtonState>>,
}

impl ReadAloudButton {
    /// A button reading `text`; `None` when the task has no text attribute.
    pub fn new(text: Option<String>) -> Self {
        Self {
            text,
            state: Rc::default(),
        }
    }

    /// The glyph the button currently shows.
    pub fn glyph(&self) -> Glyph {
        self.state.borrow().glyph
    }

    /// The pending alert message, if the last read-aloud failed.
    pub fn take_alert(&self) -> Option<String> {
        self.state.borrow_mut().alert.take()
    }

    /// Start reading the button's text. Buttons without text do nothing.
    pub fn click<E: SpeechEngine>(&self, manager: &mut SpeechManager<E>) -> bool {
        let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) else {
            log::debug!("Read-aloud clicked without text");
            return false;
        };
        self.state.borrow_mut().glyph = Glyph::Hourglass;
        manager.speak(text, self.callbacks());
        true
    }

    fn callbacks(&self) -> SpeechCallbacks {
        let on_start = Rc::clone(&self.state);
        let on_end = Rc::clone(&self.state);
        let on_error = Rc::clone(&self.state);
        let on_cancel = Rc::clone(&self.state);
        SpeechCallbacks::new()
            .on_start(move || on_start.borrow_mut().glyph = Glyph::Speaker)
            .on_end(move |_| on_end.borrow_mut().glyph = Glyph::Speaker)
            .on_error(move |err| {
                let mut state = on_error.borrow_mut();
                state.glyph = Glyph::Speaker;
                state.alert = Some(format!("朗读时出错: {err}"));
            })
            .on_cancel(move || on_cancel.borrow_mut().glyph = Glyph::Speaker)
    }
}
