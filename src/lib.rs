//! Baby-cry detection monitor.
//!
//! The monitor runs one cooperative loop: acquire a fixed-length audio
//! window, isolate the cry band with a fixed-coefficient biquad bandpass
//! filter, classify the window by normalized signal energy, and on a
//! positive verdict play a lullaby that a physical stop button can
//! interrupt between notes.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → SampleSource::acquire_window → BiquadBandpass (per sample)
//!           → EnergyClassifier → CryMonitor state machine
//!           → StatusDisplay / LedIndicator / Notifier / MelodyPlayer
//! ```
//!
//! Hardware is reached only through trait seams ([`audio::SampleSource`],
//! [`melody::MelodyPlayer`], [`status::StatusDisplay`],
//! [`status::LedIndicator`]), so the detection core is testable without any
//! audio device. The production binary wires those seams to cpal streams,
//! the console, and a global keyboard key standing in for the stop button.

pub mod audio;
pub mod button;
pub mod config;
pub mod control;
pub mod melody;
pub mod notify;
pub mod pipeline;
pub mod status;
