//! The speech output manager and its fallback ladder.
//!
//! A `speak` call runs through up to three attempts:
//!
//! | Tier | Text | Language | Voice | Watchdog |
//! |---|---|---|---|---|
//! | [`Tier::Primary`] | full | forced to the configured locale | tie-break pick | yes |
//! | [`Tier::AutoLocale`] | full | platform default | platform default | yes |
//! | [`Tier::Truncated`] | first `truncate_chars` | platform default | platform default | no |
//!
//! A tier escalates only when its watchdog expires while the engine reports
//! it is not speaking and the attempt never reported a start. Any end or
//! error event for the live attempt is final.
//!
//! The manager is driven by its host: engine notifications come in through
//! [`SpeechManager::handle_engine_event`] (or [`SpeechManager::pump_engine`]
//! for polling engines) and time through [`SpeechManager::advance`].

use std::fmt;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::SpeechConfig;
use crate::error::SpeechError;
use crate::timer::{TimerId, TimerQueue};
use crate::utterance::{truncate_chars, Utterance, UtteranceBuilder};
use crate::voice::VoiceCatalog;
use crate::{EngineEvent, SpeechEngine, UtteranceId};

/// One rung of the fallback ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Primary,
    AutoLocale,
    Truncated,
}

impl Tier {
    /// The tier to fall back to, `None` for the last one.
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Primary => Some(Tier::AutoLocale),
            Tier::AutoLocale => Some(Tier::Truncated),
            Tier::Truncated => None,
        }
    }

    fn is_watched(self) -> bool {
        !matches!(self, Tier::Truncated)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Primary => "primary",
            Tier::AutoLocale => "auto-locale",
            Tier::Truncated => "truncated",
        })
    }
}

/// Observable state of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has been spoken yet, or the last request was cancelled.
    Idle,
    /// An attempt of this tier is live on the engine.
    Attempt(Tier),
    /// The last request reached its terminal callback.
    Done,
}

/// How a successful `speak` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// The whole text was spoken by the given tier.
    Completed { tier: Tier },
    /// Only the last-resort attempt played, and it had to cut the text.
    Truncated {
        spoken_chars: usize,
        total_chars: usize,
    },
}

type StartFn = Box<dyn FnOnce()>;
type EndFn = Box<dyn FnOnce(SpeechOutcome)>;
type ErrorFn = Box<dyn FnOnce(SpeechError)>;

/// Single-shot callbacks for one `speak` call.
///
/// `on_start` fires at most once. Exactly one of `on_end` / `on_error` fires
/// unless the request is superseded by a newer `speak` or cancelled. In that
/// case only `on_cancel` fires, before any attempt of the newer request is
/// submitted, and nothing else fires afterwards.
#[derive(Default)]
pub struct SpeechCallbacks {
    on_start: Option<StartFn>,
    on_end: Option<EndFn>,
    on_error: Option<ErrorFn>,
    on_cancel: Option<StartFn>,
}

impl SpeechCallbacks {
    /// Callbacks that ignore every notification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when audio first starts playing.
    pub fn on_start(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Called when the request finishes speaking.
    pub fn on_end(mut self, f: impl FnOnce(SpeechOutcome) + 'static) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }

    /// Called when the request fails.
    pub fn on_error(mut self, f: impl FnOnce(SpeechError) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Called when a newer `speak` or an explicit `cancel` drops the request.
    pub fn on_cancel(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }

    fn cancelled(self) {
        if let Some(f) = self.on_cancel {
            f();
        }
    }

    fn started(&mut self) {
        if let Some(f) = self.on_start.take() {
            f();
        }
    }

    fn finish(self, result: Result<SpeechOutcome, SpeechError>) {
        match result {
            Ok(outcome) => {
                if let Some(f) = self.on_end {
                    f(outcome);
                }
            }
            Err(err) => {
                if let Some(f) = self.on_error {
                    f(err);
                }
            }
        }
    }
}

impl fmt::Debug for SpeechCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_end", &self.on_end.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct SpeechRequest {
    text: String,
    callbacks: SpeechCallbacks,
    started: bool,
}

/// The attempt currently registered with the engine.
#[derive(Debug)]
struct LiveAttempt {
    tier: Tier,
    utterance: UtteranceId,
    request: SpeechRequest,
}

/// Owns the engine's playback slot and runs the fallback ladder.
///
/// Constructed with `None` when the platform has no speech engine; every
/// `speak` then fails immediately with [`SpeechError::Unsupported`].
pub struct SpeechManager<E: SpeechEngine> {
    engine: Option<E>,
    config: SpeechConfig,
    catalog: VoiceCatalog,
    timers: TimerQueue,
    watchdog: Option<TimerId>,
    catalog_probe: Option<TimerId>,
    live: Option<LiveAttempt>,
    finished: bool,
    next_utterance: u64,
}

impl<E: SpeechEngine> SpeechManager<E> {
    /// Create a manager, query the voice catalog once, and schedule a second
    /// query if it came back empty.
    pub fn new(engine: Option<E>, config: SpeechConfig) -> Self {
        let mut manager = Self {
            engine,
            config,
            catalog: VoiceCatalog::default(),
            timers: TimerQueue::new(),
            watchdog: None,
            catalog_probe: None,
            live: None,
            finished: false,
            next_utterance: 0,
        };

        if manager.engine.is_none() {
            warn!("No speech engine available, read-aloud is disabled");
            return manager;
        }

        manager.refresh_voice_catalog();
        if !manager.catalog.is_loaded() {
            let delay = manager.config.catalog_probe_delay();
            debug!("Voice catalog empty at startup, probing again in {delay:?}");
            manager.catalog_probe = Some(manager.timers.schedule(delay));
        }
        manager
    }

    /// Whether the platform has a speech engine.
    pub fn is_supported(&self) -> bool {
        self.engine.is_some()
    }

    /// The settings the manager was built with.
    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    /// The cached voice snapshot.
    pub fn voice_catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    /// The engine, if the platform has one.
    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// Mutable access to the engine, if the platform has one.
    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    /// Where the current or last request stands.
    pub fn phase(&self) -> Phase {
        match (&self.live, self.finished) {
            (Some(live), _) => Phase::Attempt(live.tier),
            (None, true) => Phase::Done,
            (None, false) => Phase::Idle,
        }
    }

    /// True when no request is waiting on the engine.
    pub fn is_idle(&self) -> bool {
        self.live.is_none()
    }

    /// Whether a watchdog is currently armed.
    pub fn has_watchdog(&self) -> bool {
        self.watchdog.is_some()
    }

    /// Time until the next timer the manager owns is due.
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Replace the cached voice snapshot with the platform's current list.
    ///
    /// Errors are logged and leave the previous snapshot in place.
    pub fn refresh_voice_catalog(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match engine.voices() {
            Ok(voices) => {
                debug!("Voice catalog refreshed: {} voices", voices.len());
                self.catalog.replace(voices);
            }
            Err(e) => warn!(
                "Failed to read voice list, keeping {} cached voices: {e}",
                self.catalog.len()
            ),
        }
    }

    /// Speak `text`, superseding anything in flight.
    pub fn speak(&mut self, text: impl Into<String>, callbacks: SpeechCallbacks) {
        let text = text.into();
        if self.engine.is_none() {
            error!("Speech synthesis is not supported on this platform");
            callbacks.finish(Err(SpeechError::Unsupported));
            return;
        }

        self.clear_watchdog();
        if let Some(previous) = self.live.take() {
            debug!(
                "Superseding {} ({} attempt) with a new request",
                previous.utterance, previous.tier
            );
            previous.request.callbacks.cancelled();
        }
        self.finished = false;
        self.stop_engine();
        self.refresh_voice_catalog();

        info!("Reading aloud {} chars", text.chars().count());
        let request = SpeechRequest {
            text,
            callbacks,
            started: false,
        };
        self.start_attempt(Tier::Primary, request);
    }

    /// Stop speech and drop the live request. Only its `on_cancel` fires.
    ///
    /// Returns whether a request was in flight.
    pub fn cancel(&mut self) -> bool {
        self.clear_watchdog();
        let previous = self.live.take();
        self.finished = false;
        self.stop_engine();
        match previous {
            Some(previous) => {
                info!("Speech cancelled");
                previous.request.callbacks.cancelled();
                true
            }
            None => false,
        }
    }

    /// Feed one engine notification into the state machine.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::VoicesChanged => self.refresh_voice_catalog(),
            EngineEvent::Started(id) => {
                let Some(live) = self.live.as_mut().filter(|live| live.utterance == id) else {
                    debug!("Ignoring start of stale utterance {id}");
                    return;
                };
                if !live.request.started {
                    debug!("{id} started ({} attempt)", live.tier);
                    live.request.started = true;
                    live.request.callbacks.started();
                }
            }
            EngineEvent::Ended(id) => {
                let Some(live) = self.take_live(id) else {
                    debug!("Ignoring end of stale utterance {id}");
                    return;
                };
                let outcome = self.outcome_of(&live);
                info!("{id} finished: {outcome:?}");
                self.finish(live.request, Ok(outcome));
            }
            EngineEvent::Failed(id, code) => {
                let Some(live) = self.take_live(id) else {
                    debug!("Ignoring error from stale utterance {id}: {code}");
                    return;
                };
                let err = match live.tier {
                    Tier::Truncated => SpeechError::AllStrategiesFailed { code },
                    tier => SpeechError::Platform { tier, code },
                };
                warn!("{id} failed: {err}");
                self.finish(live.request, Err(err));
            }
        }
    }

    /// Drain and handle every event the engine has queued.
    pub fn pump_engine(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.engine.as_mut().and_then(|e| e.poll_event()) {
            self.handle_engine_event(event);
            handled += 1;
        }
        handled
    }

    /// Move the manager's clock forward, firing due timers in order.
    ///
    /// Each timer is handled at its own deadline, so a watchdog armed while
    /// handling an earlier one is measured from that earlier deadline.
    pub fn advance(&mut self, elapsed: Duration) {
        let until = self.timers.now() + elapsed;
        while let Some(id) = self.timers.pop_due(until) {
            self.handle_timer(id);
        }
        self.timers.settle(until);
    }

    fn handle_timer(&mut self, id: TimerId) {
        if self.catalog_probe == Some(id) {
            self.catalog_probe = None;
            if !self.catalog.is_loaded() {
                info!("Voice catalog still empty, probing again");
                self.refresh_voice_catalog();
            }
            return;
        }

        if self.watchdog != Some(id) {
            debug!("Ignoring stale timer {id:?}");
            return;
        }
        self.watchdog = None;

        let Some(live) = self.live.take() else {
            return;
        };
        let speaking = self.engine.as_mut().is_some_and(|e| e.is_speaking());
        if speaking || live.request.started {
            debug!("{} is speaking, watchdog stands down", live.utterance);
            self.live = Some(live);
            return;
        }
        let Some(next) = live.tier.next() else {
            self.live = Some(live);
            return;
        };

        warn!(
            "{} attempt did not start within {}ms, falling back to {next} attempt",
            live.tier, self.config.watchdog_ms
        );
        self.stop_engine();
        self.start_attempt(next, live.request);
    }

    fn start_attempt(&mut self, tier: Tier, request: SpeechRequest) {
        self.clear_watchdog();
        self.next_utterance += 1;
        let id = UtteranceId(self.next_utterance);

        let submitted = self.build_utterance(id, tier, &request.text).and_then(|utterance| {
            match self.engine.as_mut() {
                Some(engine) => engine
                    .speak(utterance)
                    .map_err(|e| SpeechError::Configuration(e.to_string())),
                None => Err(SpeechError::Unsupported),
            }
        });

        if let Err(err) = submitted {
            error!("Could not start {tier} attempt: {err}");
            self.finish(request, Err(err));
            return;
        }

        debug!("Submitted {id} ({tier} attempt)");
        self.live = Some(LiveAttempt {
            tier,
            utterance: id,
            request,
        });
        if tier.is_watched() {
            self.watchdog = Some(self.timers.schedule(self.config.watchdog()));
        }
    }

    fn build_utterance(
        &self,
        id: UtteranceId,
        tier: Tier,
        text: &str,
    ) -> Result<Utterance, SpeechError> {
        let cfg = &self.config;
        let mut builder = UtteranceBuilder::default();
        builder
            .id(id)
            .rate(cfg.rate)
            .volume(cfg.volume)
            .pitch(cfg.pitch);

        match tier {
            Tier::Primary => {
                builder.text(text).lang(cfg.locale.clone());
                match self.catalog.select(&cfg.locale, &cfg.language_markers) {
                    Some(voice) => {
                        debug!("Using voice {} ({})", voice.name, voice.lang);
                        builder.voice(voice.clone());
                    }
                    None => debug!("Voice catalog empty, using platform default voice"),
                }
            }
            Tier::AutoLocale => {
                builder.text(text);
            }
            Tier::Truncated => {
                let (short, cut) = truncate_chars(text, cfg.truncate_chars);
                if cut {
                    debug!("Truncating text to {} chars", cfg.truncate_chars);
                }
                builder.text(short);
            }
        }

        builder
            .build()
            .map_err(|e| SpeechError::Configuration(e.to_string()))
    }

    fn outcome_of(&self, live: &LiveAttempt) -> SpeechOutcome {
        let total_chars = live.request.text.chars().count();
        match live.tier {
            Tier::Truncated if total_chars > self.config.truncate_chars => {
                SpeechOutcome::Truncated {
                    spoken_chars: self.config.truncate_chars,
                    total_chars,
                }
            }
            tier => SpeechOutcome::Completed { tier },
        }
    }

    fn take_live(&mut self, id: UtteranceId) -> Option<LiveAttempt> {
        if self.live.as_ref().is_some_and(|live| live.utterance == id) {
            self.clear_watchdog();
            self.live.take()
        } else {
            None
        }
    }

    fn finish(&mut self, request: SpeechRequest, result: Result<SpeechOutcome, SpeechError>) {
        self.clear_watchdog();
        self.finished = true;
        request.callbacks.finish(result);
    }

    fn clear_watchdog(&mut self) {
        if let Some(id) = self.watchdog.take() {
            self.timers.cancel(id);
        }
    }

    fn stop_engine(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel();
        }
    }
}

impl<E: SpeechEngine> Drop for SpeechManager<E> {
    fn drop(&mut self) {
        if let Some(id) = self.catalog_probe.take() {
            self.timers.cancel(id);
        }
        if self.live.is_some() {
            self.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SpeechCallbacks, SpeechOutcome, Tier};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn ladder_has_three_rungs() {
        assert_eq!(Tier::Primary.next(), Some(Tier::AutoLocale));
        assert_eq!(Tier::AutoLocale.next(), Some(Tier::Truncated));
        assert_eq!(Tier::Truncated.next(), None);
        assert!(Tier::AutoLocale.is_watched());
        assert!(!Tier::Truncated.is_watched());
    }

    #[test]
    fn callbacks_fire_start_once() {
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let mut callbacks = SpeechCallbacks::new().on_start(move || *c.borrow_mut() += 1);
        callbacks.started();
        callbacks.started();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn finish_routes_to_matching_callback() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (seen.clone(), seen.clone());
        SpeechCallbacks::new()
            .on_end(move |o| a.borrow_mut().push(format!("{o:?}")))
            .on_error(move |e| b.borrow_mut().push(e.to_string()))
            .finish(Ok(SpeechOutcome::Completed {
                tier: Tier::Primary,
            }));
        assert_eq!(*seen.borrow(), vec!["Completed { tier: Primary }"]);
    }
}
