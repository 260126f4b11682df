//! Melody actuation — note tables and interruptible playback.
//!
//! The alert melody is a configured sequence of [`Note`]s. Playback goes
//! through the [`MelodyPlayer`] trait so the detection loop never touches
//! an audio device directly; [`TonePlayer`] is the cpal-backed production
//! implementation.

pub mod notes;
pub mod player;

pub use notes::{build_melody, note_freq, Note, UnknownNote};
pub use player::{MelodyPlayer, Playback, PlayerError, TonePlayer};
