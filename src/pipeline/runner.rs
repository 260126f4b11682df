//! Detection loop orchestrator — drives acquire → filter → classify → act.
//!
//! [`CryMonitor`] owns every collaborator and every piece of loop state:
//! the sample source, the filter (and with it the two-value delay state),
//! the classifier, the actuation and status sinks, the interrupt flag and
//! the state machine. There are no ambient globals; everything mutable has
//! this one owner, which is why the loop needs no locking.
//!
//! # Cycle
//!
//! ```text
//! acquire_window ──HardwareFault──▶ report, skip cycle, retry next
//!   └─▶ filter.reset() → filter_window → classify
//!         ├─ quiet  → back to sampling
//!         └─ cry    → Alerting: show alert, blink LED, notify,
//!                     clear interrupt flag, play melody
//!                       ├─ completed / interrupted → Idle
//!                       └─ ActuationFault → report, Idle, keep monitoring
//! ```
//!
//! Windows are processed strictly sequentially: while the melody plays no
//! re-acquisition happens, so a second cry-onset during playback is not
//! observed until the alert resolves. Remote commands are polled between
//! cycles, never mid-window.

use std::time::Duration;

use crate::audio::{BiquadBandpass, Detection, EnergyClassifier, SampleSource, SourceError};
use crate::button::InterruptFlag;
use crate::config::{AppConfig, ConfigError};
use crate::control::{Command, ControlLink};
use crate::melody::{MelodyPlayer, Note, Playback};
use crate::notify::Notifier;
use crate::status::{LedIndicator, StatusDisplay};

use super::state::MonitorState;

// ---------------------------------------------------------------------------
// CycleOutcome
// ---------------------------------------------------------------------------

/// What one detection cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Window classified below threshold; no actuation.
    Quiet { energy: f32 },
    /// Cry confirmed; the full alert sequence ran.
    Alerted { energy: f32, playback: Playback },
    /// Sample acquisition failed; the cycle was skipped.
    Faulted,
}

// ---------------------------------------------------------------------------
// CryMonitor
// ---------------------------------------------------------------------------

/// Poll interval while monitoring is suspended by remote command.
const SUSPENDED_POLL: Duration = Duration::from_millis(200);

/// LED pattern on detection: 5 rapid blinks of 100 ms.
const ALERT_BLINKS: u32 = 5;
const ALERT_BLINK_PERIOD: Duration = Duration::from_millis(100);

/// The detection loop.
///
/// Built from a validated [`AppConfig`] and the hardware-facing trait
/// objects; run with [`CryMonitor::run`] until a `sair` command arrives,
/// or drive individual cycles with [`CryMonitor::cycle`].
pub struct CryMonitor {
    source: Box<dyn SampleSource>,
    player: Box<dyn MelodyPlayer>,
    display: Box<dyn StatusDisplay>,
    led: Box<dyn LedIndicator>,
    notifier: Option<Box<dyn Notifier>>,
    link: Option<Box<dyn ControlLink>>,
    interrupt: InterruptFlag,

    filter: BiquadBandpass,
    classifier: EnergyClassifier,
    melody: Vec<Note>,

    state: MonitorState,
    cycle_pause: Duration,
    idle_refresh_cycles: u64,
    cycles: u64,
    detections: u64,
}

/// Whether the command loop should keep going.
#[derive(PartialEq)]
enum LoopFlow {
    Continue,
    Quit,
}

impl CryMonitor {
    /// Build the monitor from a configuration.
    ///
    /// Validates `config` first; an invalid configuration must prevent the
    /// loop from ever starting.
    pub fn new(
        source: Box<dyn SampleSource>,
        player: Box<dyn MelodyPlayer>,
        display: Box<dyn StatusDisplay>,
        led: Box<dyn LedIndicator>,
        interrupt: InterruptFlag,
        config: &AppConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            source,
            player,
            display,
            led,
            notifier: None,
            link: None,
            interrupt,
            filter: BiquadBandpass::new(config.filter),
            classifier: EnergyClassifier::new(config.detection.threshold),
            melody: config.melody.to_melody()?,
            state: MonitorState::Idle,
            cycle_pause: Duration::from_secs_f32(config.sampling.pause_secs.max(0.0)),
            idle_refresh_cycles: u64::from(config.sampling.idle_refresh_cycles.max(1)),
            cycles: 0,
            detections: 0,
        })
    }

    /// Attach a push-notification channel.
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Attach a remote control link.
    pub fn with_control_link(mut self, link: Box<dyn ControlLink>) -> Self {
        self.link = Some(link);
        self
    }

    /// Current loop state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Number of confirmed detections since startup.
    pub fn detections(&self) -> u64 {
        self.detections
    }

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------

    /// Run until a `sair` command arrives.
    ///
    /// Recoverable faults never end the loop; continuous monitoring is the
    /// primary reliability requirement.
    pub fn run(&mut self) {
        log::info!(
            "cry monitor started (threshold {}, melody of {} notes)",
            self.classifier.threshold(),
            self.melody.len()
        );
        self.display.show("Sistema", "iniciado");

        loop {
            if self.handle_commands() == LoopFlow::Quit {
                log::info!("cry monitor shutting down ({} detections)", self.detections);
                return;
            }

            if self.state == MonitorState::Suspended {
                std::thread::sleep(SUSPENDED_POLL);
                continue;
            }

            self.cycle();
            std::thread::sleep(self.cycle_pause);
        }
    }

    // -----------------------------------------------------------------------
    // Detection cycle
    // -----------------------------------------------------------------------

    /// Run one acquire → filter → classify → act cycle.
    ///
    /// The window buffer is cycle-scoped and freed when the cycle ends;
    /// nothing audio-sized survives into the next iteration.
    pub fn cycle(&mut self) -> CycleOutcome {
        // Refresh the idle status at reduced cadence to avoid display churn.
        if self.cycles % self.idle_refresh_cycles == 0 {
            self.display.show("Monitorando", "");
        }
        self.cycles += 1;

        let detection = match self.measure() {
            Ok(d) => d,
            Err(e) => {
                log::warn!("sample acquisition failed, skipping cycle: {e}");
                self.display.show("Falha no sensor", "");
                return CycleOutcome::Faulted;
            }
        };

        if !detection.is_cry {
            log::debug!("no cry (energia {:.6})", detection.energy);
            return CycleOutcome::Quiet {
                energy: detection.energy,
            };
        }

        self.detections += 1;
        log::info!(
            "cry detected (energia {:.6}, detection #{})",
            detection.energy,
            self.detections
        );

        // Idle → Alerting: status first, then actuation.
        self.state = MonitorState::Alerting;
        self.display.show("Choro detectado!", "");
        self.led.blink(ALERT_BLINKS, ALERT_BLINK_PERIOD);

        if let Some(notifier) = &self.notifier {
            let message = format!("Energia: {:.5}", detection.energy);
            if let Err(e) = notifier.notify("Choro detectado!", &message) {
                log::warn!("notification failed: {e}");
            }
        }

        // A press from before this alert must not cancel it.
        self.interrupt.clear();

        let playback = match self.player.play(&self.melody) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("melody playback failed: {e}");
                self.display.show("Falha no alarme", "");
                Playback::Completed
            }
        };

        if playback == Playback::Interrupted {
            log::info!("melody interrupted by button");
            self.interrupt.clear();
        }

        // Alerting → Idle: resume sampling, restore the idle status line.
        self.state = MonitorState::Idle;
        self.display.show("Monitorando", "");

        CycleOutcome::Alerted {
            energy: detection.energy,
            playback,
        }
    }

    /// Acquire one window, filter it from a zeroed delay state and
    /// classify it.
    fn measure(&mut self) -> Result<Detection, SourceError> {
        let window = self.source.acquire_window()?;
        let mut samples = window.into_samples();

        self.filter.reset();
        self.filter.filter_window(&mut samples);

        Ok(self.classifier.classify(&samples))
    }

    // -----------------------------------------------------------------------
    // Remote commands
    // -----------------------------------------------------------------------

    fn handle_commands(&mut self) -> LoopFlow {
        let mut pending = Vec::new();
        if let Some(link) = self.link.as_mut() {
            while let Some(cmd) = link.poll() {
                pending.push(cmd);
            }
        }

        for cmd in pending {
            log::debug!("remote command: {cmd:?}");
            if self.handle_command(cmd) == LoopFlow::Quit {
                return LoopFlow::Quit;
            }
        }
        LoopFlow::Continue
    }

    fn handle_command(&mut self, cmd: Command) -> LoopFlow {
        match cmd {
            Command::Enable => {
                self.state = MonitorState::Idle;
                self.display.show("Sistema", "ativado");
                self.reply("Sistema ativado.");
            }
            Command::Disable => {
                self.state = MonitorState::Suspended;
                self.display.show("Sistema", "desligado");
                self.reply("Sistema desativado.");
            }
            Command::StopMelody => {
                self.player.stop();
                self.display.show("Música", "parada");
                self.reply("Música parada.");
            }
            Command::Status => {
                let answer = if self.state == MonitorState::Suspended {
                    "Inativo"
                } else {
                    "Ativo"
                };
                self.reply(answer);
            }
            Command::Message(text) => {
                self.display.show("Msg:", &text);
                self.reply(&format!("Mensagem mostrada: {text}"));
            }
            Command::ForceReading => {
                self.display.show("Forçando", "leitura...");
                match self.measure() {
                    Ok(d) => {
                        let verdict = if d.is_cry { "SIM" } else { "NÃO" };
                        self.display.show("Leitura", "concluída");
                        self.reply(&format!(
                            "Leitura - Choro: {verdict} (energia {:.5})",
                            d.energy
                        ));
                    }
                    Err(e) => {
                        log::warn!("forced reading failed: {e}");
                        self.reply("Falha na leitura do sensor.");
                    }
                }
            }
            Command::SetVolume(percent) => {
                self.player.set_volume(percent);
                self.reply(&format!("Volume ajustado para {percent}%"));
            }
            Command::Quit => {
                self.reply("Encerrando.");
                return LoopFlow::Quit;
            }
        }
        LoopFlow::Continue
    }

    fn reply(&mut self, message: &str) {
        if let Some(link) = self.link.as_mut() {
            link.reply(message);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
