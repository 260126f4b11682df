//! Melody playback behind the [`MelodyPlayer`] trait.
//!
//! Playback is the loop's only foreground activity while alerting, so the
//! stop button must be observable *during* playback. [`TonePlayer`] polls
//! the shared [`InterruptFlag`] every few milliseconds while a note
//! sounds; a press therefore stops the melody well within one
//! note-boundary of latency, without any preemption.
//!
//! The cpal output stream runs continuously and synthesizes a sine at
//! whatever frequency the control block currently holds (0 Hz = silence).
//! `play` only flips that frequency per note and sleeps; the audio thread
//! does the signal generation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use crate::button::InterruptFlag;

use super::notes::Note;

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// How a melody run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Every note sounded for its full duration.
    Completed,
    /// The stop button cut the melody short.
    Interrupted,
}

// ---------------------------------------------------------------------------
// PlayerError
// ---------------------------------------------------------------------------

/// Actuation faults. The detection loop reports these to the status sink
/// and keeps monitoring; a failure to alert must not stop detection.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("output device expects {0:?} samples, expected f32")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// MelodyPlayer trait
// ---------------------------------------------------------------------------

/// Blocking melody playback with bounded-latency interruption.
///
/// # Contract
///
/// - `play` blocks until the melody completes or the interrupt flag is
///   observed, and reports which of the two happened.
/// - `stop` takes effect within one poll interval (a fraction of a note).
/// - `set_volume` clamps to 0-100 percent and applies from the next note.
pub trait MelodyPlayer {
    /// Play `melody` from the first note, polling the interrupt flag.
    fn play(&mut self, melody: &[Note]) -> Result<Playback, PlayerError>;

    /// Request that any current or future playback stop immediately.
    fn stop(&mut self);

    /// Set playback volume as a percentage.
    fn set_volume(&mut self, percent: u8);
}

// ---------------------------------------------------------------------------
// ToneControl
// ---------------------------------------------------------------------------

/// Lock-free handoff between the control loop and the synth callback.
///
/// Frequencies and amplitudes are stored as `f32` bit patterns so the
/// audio thread never takes a lock.
#[derive(Default)]
struct ToneControl {
    freq_bits: AtomicU32,
    amp_bits: AtomicU32,
}

impl ToneControl {
    fn set_frequency(&self, hz: f32) {
        self.freq_bits.store(hz.to_bits(), Ordering::Relaxed);
    }

    fn frequency(&self) -> f32 {
        f32::from_bits(self.freq_bits.load(Ordering::Relaxed))
    }

    fn set_amplitude(&self, amp: f32) {
        self.amp_bits.store(amp.to_bits(), Ordering::Relaxed);
    }

    fn amplitude(&self) -> f32 {
        f32::from_bits(self.amp_bits.load(Ordering::Relaxed))
    }
}

// ---------------------------------------------------------------------------
// TonePlayer
// ---------------------------------------------------------------------------

/// Sine-wave [`MelodyPlayer`] over a cpal output stream, the host-side
/// counterpart of the original PWM buzzer.
pub struct TonePlayer {
    /// RAII guard: dropping the stream silences the output.
    _stream: cpal::Stream,
    control: Arc<ToneControl>,
    interrupt: InterruptFlag,
}

/// Interval at which `play` re-checks the interrupt flag mid-note.
const INTERRUPT_POLL: Duration = Duration::from_millis(10);

/// Silent gap between consecutive notes.
const NOTE_GAP: Duration = Duration::from_millis(10);

/// Full-scale amplitude at 100% volume. Headroom below 1.0 keeps the
/// sine clean on hot output chains.
const PEAK_AMPLITUDE: f32 = 0.5;

impl TonePlayer {
    /// Open the default output device and start the (initially silent)
    /// synth stream.
    pub fn open(volume_percent: u8, interrupt: InterruptFlag) -> Result<Self, PlayerError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(PlayerError::NoDevice)?;

        let supported = device.default_output_config()?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(PlayerError::UnsupportedFormat(supported.sample_format()));
        }

        let channels = supported.channels() as usize;
        let sample_rate = supported.sample_rate().0 as f32;
        let config: cpal::StreamConfig = supported.into();

        let control = Arc::new(ToneControl::default());
        control.set_amplitude(Self::amplitude_for(volume_percent));

        let synth = Arc::clone(&control);
        let mut phase = 0.0_f32;

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let freq = synth.frequency();
                let amp = synth.amplitude();
                for frame in data.chunks_mut(channels) {
                    let value = if freq > 0.0 {
                        amp * (std::f32::consts::TAU * phase).sin()
                    } else {
                        0.0
                    };
                    phase += freq / sample_rate;
                    if phase >= 1.0 {
                        phase -= 1.0;
                    }
                    for sample in frame {
                        *sample = value;
                    }
                }
            },
            |err: cpal::StreamError| {
                log::error!("synth stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        log::info!("melody output started ({sample_rate} Hz, {channels} ch)");

        Ok(Self {
            _stream: stream,
            control,
            interrupt,
        })
    }

    fn amplitude_for(volume_percent: u8) -> f32 {
        PEAK_AMPLITUDE * (volume_percent.min(100) as f32 / 100.0)
    }
}

impl MelodyPlayer for TonePlayer {
    fn play(&mut self, melody: &[Note]) -> Result<Playback, PlayerError> {
        for note in melody {
            self.control.set_frequency(note.freq_hz as f32);

            let note_end = Instant::now() + note.duration;
            loop {
                if self.interrupt.is_set() {
                    self.control.set_frequency(0.0);
                    return Ok(Playback::Interrupted);
                }
                let now = Instant::now();
                if now >= note_end {
                    break;
                }
                std::thread::sleep(INTERRUPT_POLL.min(note_end - now));
            }

            self.control.set_frequency(0.0);
            std::thread::sleep(NOTE_GAP);
        }

        Ok(Playback::Completed)
    }

    fn stop(&mut self) {
        self.interrupt.set();
        self.control.set_frequency(0.0);
    }

    fn set_volume(&mut self, percent: u8) {
        self.control.set_amplitude(Self::amplitude_for(percent));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- ToneControl --------------------------------------------------------

    #[test]
    fn tone_control_round_trips_frequency_and_amplitude() {
        let control = ToneControl::default();
        control.set_frequency(440.0);
        control.set_amplitude(0.25);
        assert_eq!(control.frequency(), 440.0);
        assert_eq!(control.amplitude(), 0.25);
    }

    #[test]
    fn tone_control_starts_silent() {
        let control = ToneControl::default();
        assert_eq!(control.frequency(), 0.0);
        assert_eq!(control.amplitude(), 0.0);
    }

    // ---- Volume mapping -----------------------------------------------------

    #[test]
    fn volume_scales_linearly_to_peak() {
        assert_eq!(TonePlayer::amplitude_for(0), 0.0);
        assert!((TonePlayer::amplitude_for(50) - PEAK_AMPLITUDE * 0.5).abs() < 1e-6);
        assert_eq!(TonePlayer::amplitude_for(100), PEAK_AMPLITUDE);
    }

    #[test]
    fn volume_above_100_is_clamped() {
        assert_eq!(TonePlayer::amplitude_for(255), PEAK_AMPLITUDE);
    }

    // ---- Playback enum ------------------------------------------------------

    #[test]
    fn playback_variants_are_distinct() {
        assert_ne!(Playback::Completed, Playback::Interrupted);
    }
}
