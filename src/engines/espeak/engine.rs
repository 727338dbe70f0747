use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use crate::utterance::Utterance;
use crate::voice::Voice;
use crate::{EngineEvent, SpeechEngine, UtteranceId};

use super::voices::parse_voice_list;

/// Words per minute espeak-ng uses at rate 1.0.
const BASE_WPM: f32 = 175.0;

#[derive(thiserror::Error, Debug)]
pub enum EspeakError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    NotFound,
    #[error("espeak-ng failed: {0}")]
    Failed(String),
}

/// Where to find espeak-ng.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    /// Binary to run. `None` uses `espeak-ng` from PATH.
    pub bin_path: Option<PathBuf>,
    /// Voice data directory, passed as `ESPEAK_DATA_PATH`.
    pub data_path: Option<PathBuf>,
}

impl EspeakConfig {
    /// Read `ESPEAK_BIN` and `ESPEAK_DATA_PATH`.
    pub fn from_env() -> Self {
        Self {
            bin_path: std::env::var_os("ESPEAK_BIN").map(PathBuf::from),
            data_path: std::env::var_os("ESPEAK_DATA_PATH").map(PathBuf::from),
        }
    }

    fn command(&self) -> Command {
        let bin = self
            .bin_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("espeak-ng"));
        let mut cmd = Command::new(bin);
        if let Some(ref data) = self.data_path {
            cmd.env("ESPEAK_DATA_PATH", data);
        }
        cmd
    }
}

struct Playback {
    id: UtteranceId,
    child: Child,
}

/// Speech engine backed by the espeak-ng CLI.
///
/// Events are queued internally and handed out through
/// [`SpeechEngine::poll_event`]; a host loop should call
/// [`SpeechManager::pump_engine`](crate::SpeechManager::pump_engine)
/// regularly.
pub struct EspeakEngine {
    espeak: EspeakConfig,
    playback: Option<Playback>,
    events: VecDeque<EngineEvent>,
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EspeakEngine {
    /// Create a new engine that uses `espeak-ng` from PATH.
    pub fn new() -> Self {
        Self::with_config(EspeakConfig::default())
    }

    /// Create a new engine with explicit espeak-ng binary and data paths.
    ///
    /// Either path can be `None` to fall back to the system default.
    pub fn with_espeak(bin_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Self {
        Self::with_config(EspeakConfig {
            bin_path,
            data_path,
        })
    }

    /// Create a new engine from an explicit [`EspeakConfig`].
    pub fn with_config(espeak: EspeakConfig) -> Self {
        Self {
            espeak,
            playback: None,
            events: VecDeque::new(),
        }
    }

    /// True when the espeak-ng binary can be executed.
    pub fn is_available(&self) -> bool {
        self.espeak
            .command()
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    fn spawn(&self, utterance: &Utterance) -> Result<Child, EspeakError> {
        let mut cmd = self.espeak.command();
        cmd.args(prosody_args(utterance))
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EspeakError::NotFound
            } else {
                EspeakError::Io(e)
            }
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload = canonicalize_stdin_payload(&utterance.text);
            if let Err(e) = stdin.write_all(payload.as_bytes()) {
                kill(&mut child);
                return Err(EspeakError::Io(e));
            }
        }

        Ok(child)
    }

    /// Turn a finished child process into an end or error event.
    fn reap(&mut self) {
        let Some(playback) = self.playback.as_mut() else {
            return;
        };
        let event = match playback.child.try_wait() {
            Ok(None) => return,
            Ok(Some(status)) if status.success() => EngineEvent::Ended(playback.id),
            Ok(Some(status)) => EngineEvent::Failed(
                playback.id,
                match status.code() {
                    Some(code) => format!("synthesis-failed (exit code {code})"),
                    None => "synthesis-failed (terminated by signal)".to_string(),
                },
            ),
            Err(e) => EngineEvent::Failed(playback.id, format!("synthesis-failed ({e})")),
        };
        self.playback = None;
        self.events.push_back(event);
    }
}

impl Drop for EspeakEngine {
    fn drop(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            kill(&mut playback.child);
        }
    }
}

impl SpeechEngine for EspeakEngine {
    fn cancel(&mut self) {
        self.reap();
        if let Some(mut playback) = self.playback.take() {
            log::debug!("Killing espeak-ng for {}", playback.id);
            kill(&mut playback.child);
            self.events
                .push_back(EngineEvent::Failed(playback.id, "interrupted".to_string()));
        }
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), Box<dyn std::error::Error>> {
        self.cancel();
        let child = self.spawn(&utterance)?;
        self.playback = Some(Playback {
            id: utterance.id,
            child,
        });
        self.events.push_back(EngineEvent::Started(utterance.id));
        Ok(())
    }

    fn is_speaking(&mut self) -> bool {
        self.reap();
        self.playback.is_some()
    }

    fn voices(&mut self) -> Result<Vec<Voice>, Box<dyn std::error::Error>> {
        let output = self
            .espeak
            .command()
            .arg("--voices")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EspeakError::NotFound
                } else {
                    EspeakError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Box::new(EspeakError::Failed(format!(
                "--voices exited with code {:?}: {stderr}",
                output.status.code()
            ))));
        }

        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        if self.events.is_empty() {
            self.reap();
        }
        self.events.pop_front()
    }
}

/// espeak-ng flags for an utterance's voice and prosody.
fn prosody_args(utterance: &Utterance) -> Vec<String> {
    let mut args = Vec::new();

    let voice = utterance
        .voice
        .as_ref()
        .map(|v| v.lang.as_str())
        .or(utterance.lang.as_deref());
    if let Some(voice) = voice {
        args.push("-v".to_string());
        args.push(voice.to_string());
    }

    let wpm = (BASE_WPM * utterance.rate).round().clamp(80.0, 450.0) as u32;
    let amplitude = (100.0 * utterance.volume).round().clamp(0.0, 200.0) as u32;
    let pitch = (50.0 * utterance.pitch).round().clamp(0.0, 99.0) as u32;
    args.extend([
        "-s".to_string(),
        wpm.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
        "-p".to_string(),
        pitch.to_string(),
    ]);

    args
}

/// espeak-ng reads stdin line by line; the last line needs its terminator
/// or the final word can be dropped.
fn canonicalize_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::debug!("espeak-ng already exited: {e}");
    }
    if let Err(e) = child.wait() {
        log::warn!("Failed to reap espeak-ng: {e}");
    }
}
