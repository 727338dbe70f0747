use crate::manager::Tier;

/// Every failure a `speak` call can end in. Delivered through the caller's
/// `on_error` callback, never returned or panicked.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech synthesis is not supported on this platform")]
    Unsupported,
    #[error("speech engine error during {tier} attempt: {code}")]
    Platform { tier: Tier, code: String },
    #[error("failed to configure utterance: {0}")]
    Configuration(String),
    #[error("all speech strategies failed: {code}")]
    AllStrategiesFailed { code: String },
}
