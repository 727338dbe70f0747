use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use emerald_speech::{
    engines::espeak::{EspeakConfig, EspeakEngine},
    SpeechCallbacks, SpeechConfig, SpeechManager,
};

/// How often the host loop polls the engine when no timer is due sooner.
const TICK: Duration = Duration::from_millis(20);

/// The truncated attempt has no watchdog, so the manager stays busy until the
/// engine reports an end. Give up after this long of wall-clock time.
const MAX_WAIT: Duration = Duration::from_secs(120);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let engine = EspeakEngine::with_config(EspeakConfig::from_env());
    let engine = engine.is_available().then_some(engine);
    let mut manager = SpeechManager::new(engine, SpeechConfig::from_env());
    println!(
        "Voices available: {}",
        manager.voice_catalog().voices().len()
    );

    let text = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "今日任务：砍十棵橡树，完成后可获得五颗绿宝石。".to_string());

    let result = Rc::new(RefCell::new(None));
    let (on_end, on_error) = (Rc::clone(&result), Rc::clone(&result));
    let started = Instant::now();
    manager.speak(
        text.as_str(),
        SpeechCallbacks::new()
            .on_start(move || println!("Speaking after {:.2?}", started.elapsed()))
            .on_end(move |outcome| *on_end.borrow_mut() = Some(Ok(outcome)))
            .on_error(move |err| *on_error.borrow_mut() = Some(Err(err))),
    );

    let mut last = Instant::now();
    while !manager.is_idle() {
        if started.elapsed() > MAX_WAIT {
            log::warn!("No end of speech after {MAX_WAIT:?}, cancelling");
            manager.cancel();
            break;
        }
        let wait = manager.poll_timeout().map_or(TICK, |t| t.min(TICK));
        std::thread::sleep(wait);
        manager.pump_engine();
        let now = Instant::now();
        manager.advance(now - last);
        last = now;
    }

    match result.borrow_mut().take() {
        Some(Ok(outcome)) => println!("Finished in {:.2?}: {outcome:?}", started.elapsed()),
        Some(Err(err)) => return Err(Box::new(err)),
        None => println!("Speech was cancelled after {:.2?}", started.elapsed()),
    }
    Ok(())
}
