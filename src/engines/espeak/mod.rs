//! espeak-ng speech engine implementation.
//!
//! Plays utterances by spawning the `espeak-ng` binary, which renders audio
//! straight to the default output device. One child process is one
//! utterance; killing it is how playback is cancelled.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed on your system:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>
//!
//! # Prosody Mapping
//!
//! | Utterance field | espeak-ng flag | Mapping |
//! |---|---|---|
//! | `rate` | `-s` | 175 words per minute × rate, 80–450 |
//! | `volume` | `-a` | 100 × volume, 0–200 |
//! | `pitch` | `-p` | 50 × pitch, 0–99 |
//! | `voice` / `lang` | `-v` | voice language code, else forced language |
//!
//! # Examples
//!
//! ```rust,no_run
//! use emerald_speech::{engines::espeak::EspeakEngine, SpeechEngine};
//!
//! let mut engine = EspeakEngine::new();
//! for voice in engine.voices()? {
//!     println!("{} {}", voice.lang, voice.name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod voices;

pub use engine::{EspeakConfig, EspeakEngine, EspeakError};
