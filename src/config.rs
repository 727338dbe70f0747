use std::time::Duration;

use serde::Deserialize;

/// Settings for the [`SpeechManager`](crate::SpeechManager).
///
/// Defaults match the task tracker: Mandarin, slightly slow, full volume.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Locale forced on the primary attempt.
    pub locale: String,
    /// Substrings of voice names that identify a voice for `locale`.
    pub language_markers: Vec<String>,
    pub rate: f32,
    pub volume: f32,
    pub pitch: f32,
    /// How long each watched tier gets to start speaking.
    pub watchdog_ms: u64,
    /// Delay before re-probing an empty voice catalog after startup.
    pub catalog_probe_ms: u64,
    /// Character budget for the last-resort attempt.
    pub truncate_chars: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "zh-CN".to_string(),
            language_markers: vec!["Chinese".to_string(), "中文".to_string()],
            rate: 0.9,
            volume: 1.0,
            pitch: 1.0,
            watchdog_ms: 500,
            catalog_probe_ms: 1000,
            truncate_chars: 200,
        }
    }
}

impl SpeechConfig {
    /// Defaults overridden by `SPEECH_*` environment variables.
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(locale) = std::env::var("SPEECH_LOCALE") {
            if !locale.trim().is_empty() {
                cfg.locale = locale.trim().to_string();
            }
        }
        if let Some(rate) = env_parse("SPEECH_RATE") {
            cfg.rate = rate;
        }
        if let Some(volume) = env_parse("SPEECH_VOLUME") {
            cfg.volume = volume;
        }
        if let Some(ms) = env_parse("SPEECH_WATCHDOG_MS") {
            cfg.watchdog_ms = ms;
        }
        if let Some(ms) = env_parse("SPEECH_CATALOG_PROBE_MS") {
            cfg.catalog_probe_ms = ms;
        }
        if let Some(chars) = env_parse("SPEECH_TRUNCATE_CHARS") {
            cfg.truncate_chars = chars;
        }
        cfg
    }

    /// Parse a JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Per-tier watchdog window.
    pub fn watchdog(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    /// Delay before the one-off retry of an empty catalog refresh.
    pub fn catalog_probe_delay(&self) -> Duration {
        Duration::from_millis(self.catalog_probe_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}
