//! Application entry point — acalanto baby-cry monitor.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run) and
//!    validate it — an invalid configuration is fatal here, before the
//!    loop exists.
//! 3. Create the interrupt flag and start the stop-button listener.
//! 4. Open the microphone source; degrade to a fault-reporting stub when
//!    no input device is available.
//! 5. Open the melody output; degrade to a silent stub likewise.
//! 6. Wire console status sinks, the optional Pushover notifier and the
//!    stdin control link.
//! 7. Run the monitor — blocks until a `sair` command arrives.

use anyhow::Context;

use acalanto::{
    audio::{MicSource, SampleSource, SampleWindow, SourceError},
    button::{parse_key, ButtonListener, InterruptFlag},
    config::AppConfig,
    control::StdinLink,
    melody::{MelodyPlayer, Note, Playback, PlayerError, TonePlayer},
    notify::PushoverNotifier,
    pipeline::CryMonitor,
    status::{ConsoleDisplay, ConsoleLed},
};

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("acalanto starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.validate().context("invalid configuration")?;

    // 3. Stop button
    let interrupt = InterruptFlag::new();
    let _button = match parse_key(&config.button.stop_key) {
        Some(key) => {
            log::info!("stop button bound to {:?}", config.button.stop_key);
            Some(ButtonListener::start(key, interrupt.clone()))
        }
        None => {
            log::warn!(
                "unknown stop key {:?}; button interrupt disabled",
                config.button.stop_key
            );
            None
        }
    };

    // 4. Sample source
    let window_samples = config.sampling.window_samples();
    let source: Box<dyn SampleSource> =
        match MicSource::open(config.sampling.sample_rate, window_samples) {
            Ok(source) => Box::new(source),
            Err(e) => {
                log::warn!(
                    "microphone unavailable ({e}); every cycle will report a hardware fault"
                );
                Box::new(DeadSource {
                    sample_rate: config.sampling.sample_rate,
                })
            }
        };

    // 5. Melody player
    let player: Box<dyn MelodyPlayer> =
        match TonePlayer::open(config.melody.volume, interrupt.clone()) {
            Ok(player) => Box::new(player),
            Err(e) => {
                log::warn!("audio output unavailable ({e}); alerts will be silent");
                Box::new(SilentPlayer)
            }
        };

    // 6. Sinks, notifier, control link
    let display = Box::new(ConsoleDisplay::new());
    let led = Box::new(ConsoleLed::new());

    let mut monitor = CryMonitor::new(source, player, display, led, interrupt, &config)
        .context("failed to build monitor")?;

    if config.notify.enabled {
        log::info!("pushover notifications enabled");
        monitor = monitor.with_notifier(Box::new(PushoverNotifier::from_config(&config.notify)));
    }

    monitor = monitor.with_control_link(Box::new(StdinLink::start()));

    // 7. Run (blocks until "sair")
    monitor.run();
    Ok(())
}

// ---------------------------------------------------------------------------
// DeadSource — fallback SampleSource when no input device is present
// ---------------------------------------------------------------------------

/// Reports a hardware fault on every acquisition so the loop keeps
/// retrying and the fault stays visible on the status sink.
struct DeadSource {
    sample_rate: u32,
}

impl SampleSource for DeadSource {
    fn acquire_window(&mut self) -> Result<SampleWindow, SourceError> {
        Err(SourceError::NoDevice)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

// ---------------------------------------------------------------------------
// SilentPlayer — fallback MelodyPlayer when no output device is present
// ---------------------------------------------------------------------------

/// Fails every playback so alerts surface as actuation faults instead of
/// silently pretending to play.
struct SilentPlayer;

impl MelodyPlayer for SilentPlayer {
    fn play(&mut self, _melody: &[Note]) -> Result<Playback, PlayerError> {
        Err(PlayerError::NoDevice)
    }

    fn stop(&mut self) {}

    fn set_volume(&mut self, _percent: u8) {}
}
