//! Speech engines.
//!
//! This module contains implementations of [`SpeechEngine`](crate::SpeechEngine).
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `espeak` - espeak-ng command line synthesizer (espeak-ng required)

#[cfg(feature = "espeak")]
pub mod espeak;
