use derive_builder::Builder;

use crate::voice::Voice;
use crate::UtteranceId;

/// One unit of text submitted to a [`SpeechEngine`](crate::SpeechEngine).
///
/// Built through [`UtteranceBuilder`]; `build()` rejects out-of-range
/// prosody values, which the manager reports as a configuration error.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Utterance {
    pub id: UtteranceId,
    #[builder(setter(into))]
    pub text: String,
    /// Forced language tag. `None` lets the platform auto-select.
    #[builder(setter(into, strip_option), default)]
    pub lang: Option<String>,
    /// Speaking rate multiplier, 0.1 to 10.
    #[builder(default = "1.0")]
    pub rate: f32,
    /// Volume, 0 to 1.
    #[builder(default = "1.0")]
    pub volume: f32,
    /// Pitch, 0 to 2.
    #[builder(default = "1.0")]
    pub pitch: f32,
    #[builder(setter(strip_option), default)]
    pub voice: Option<Voice>,
}

impl UtteranceBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(rate) = self.rate {
            if !(0.1..=10.0).contains(&rate) {
                return Err(format!("rate {rate} is outside 0.1..=10"));
            }
        }
        if let Some(volume) = self.volume {
            if !(0.0..=1.0).contains(&volume) {
                return Err(format!("volume {volume} is outside 0..=1"));
            }
        }
        if let Some(pitch) = self.pitch {
            if !(0.0..=2.0).contains(&pitch) {
                return Err(format!("pitch {pitch} is outside 0..=2"));
            }
        }
        Ok(())
    }
}

impl Utterance {
    /// Character count of the text, which is what truncation is measured in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// First `max_chars` characters of `text`, plus whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (text[..byte_idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::{truncate_chars, UtteranceBuilder};
    use crate::UtteranceId;

    #[test]
    fn builder_applies_defaults() {
        let utterance = UtteranceBuilder::default()
            .id(UtteranceId(1))
            .text("你好")
            .build()
            .unwrap();
        assert_eq!(utterance.lang, None);
        assert_eq!(utterance.rate, 1.0);
        assert_eq!(utterance.volume, 1.0);
        assert_eq!(utterance.voice, None);
        assert_eq!(utterance.char_len(), 2);
    }

    #[test]
    fn builder_rejects_out_of_range_volume() {
        let err = UtteranceBuilder::default()
            .id(UtteranceId(1))
            .text("hi")
            .volume(1.5)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("volume"));
    }

    #[test]
    fn builder_requires_text() {
        assert!(UtteranceBuilder::default().id(UtteranceId(1)).build().is_err());
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let (text, cut) = truncate_chars("完成任务获得绿宝石", 4);
        assert_eq!(text, "完成任务");
        assert!(cut);
    }

    #[test]
    fn short_text_is_not_truncated() {
        assert_eq!(truncate_chars("abc", 3), ("abc".to_string(), false));
        assert_eq!(truncate_chars("", 200), (String::new(), false));
    }
}
