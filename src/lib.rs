//! # emerald-speech
//!
//! Read-aloud speech output for the Emerald task tracker, plus the small
//! pieces of view glue that sit next to it.
//!
//! ## Features
//!
//! - **Fallback ladder**: a primary utterance with a forced locale, a retry
//!   that lets the platform pick the language, and a final truncated retry
//! - **Watchdogs**: each tier is given a bounded window to start speaking
//! - **Voice catalog**: cached snapshot with a delayed second query for platforms
//!   that never announce their voices
//! - **espeak-ng engine**: a real [`SpeechEngine`] behind the `espeak` feature
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! emerald-speech = { version = "2026.10", features = ["espeak"] }
//! ```
//!
//! ```ignore
//! use std::time::Duration;
//! use emerald_speech::{engines::espeak::EspeakEngine, SpeechCallbacks, SpeechConfig, SpeechManager};
//!
//! let mut manager = SpeechManager::new(Some(EspeakEngine::new()), SpeechConfig::default());
//! manager.speak(
//!     "挖十块圆石",
//!     SpeechCallbacks::new().on_end(|outcome| println!("done: {outcome:?}")),
//! );
//! while !manager.is_idle() {
//!     manager.pump_engine();
//!     manager.advance(Duration::from_millis(20));
//! }
//! ```

pub mod api;
pub mod config;
pub mod countdown;
pub mod engines;
pub mod error;
pub mod manager;
pub mod read_aloud;
pub mod timer;
pub mod utterance;
pub mod voice;

use std::fmt;

pub use config::SpeechConfig;
pub use error::SpeechError;
pub use manager::{Phase, SpeechCallbacks, SpeechManager, SpeechOutcome, Tier};
pub use timer::{TimerId, TimerQueue};
pub use utterance::{Utterance, UtteranceBuilder};
pub use voice::{Voice, VoiceCatalog};

/// Identifier the manager assigns to every utterance it submits.
///
/// Engines echo it back in [`EngineEvent`]s so that events belonging to a
/// superseded attempt can be told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utt-{}", self.0)
    }
}

/// Notifications an engine delivers back to the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Audio for the utterance started playing.
    Started(UtteranceId),
    /// The utterance finished playing.
    Ended(UtteranceId),
    /// The engine gave up on the utterance; the payload is the platform's
    /// error code (e.g. `"interrupted"`, `"synthesis-failed"`).
    Failed(UtteranceId, String),
    /// The platform's voice list changed.
    VoicesChanged,
}

/// Common interface for platform speech engines.
///
/// An engine owns a single playback slot. The [`SpeechManager`] is the only
/// component expected to write to it: it cancels before every submission, so
/// at most one utterance is ever live.
pub trait SpeechEngine {
    /// Stop whatever is playing and drop any queued utterance.
    fn cancel(&mut self);

    /// Submit an utterance for playback.
    ///
    /// Returning `Err` means the utterance could not even be configured; no
    /// events will be delivered for it. Otherwise the engine must eventually
    /// report `Ended` or `Failed` for it: the last-resort attempt has no
    /// watchdog, and the manager stays busy until one of them arrives.
    fn speak(&mut self, utterance: Utterance) -> Result<(), Box<dyn std::error::Error>>;

    /// Whether the engine is currently producing audio.
    fn is_speaking(&mut self) -> bool;

    /// Read the platform's current voice list. May legitimately be empty.
    fn voices(&mut self) -> Result<Vec<Voice>, Box<dyn std::error::Error>>;

    /// Take the next pending engine notification, if any.
    ///
    /// Engines that deliver events some other way leave the default.
    fn poll_event(&mut self) -> Option<EngineEvent> {
        None
    }
}

impl<E: SpeechEngine + ?Sized> SpeechEngine for Box<E> {
    fn cancel(&mut self) {
        (**self).cancel();
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), Box<dyn std::error::Error>> {
        (**self).speak(utterance)
    }

    fn is_speaking(&mut self) -> bool {
        (**self).is_speaking()
    }

    fn voices(&mut self) -> Result<Vec<Voice>, Box<dyn std::error::Error>> {
        (**self).voices()
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        (**self).poll_event()
    }
}
