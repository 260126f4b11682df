//! Audio pipeline — acquisition → bandpass filter → energy classification.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → convert_chunk → WindowAccumulator
//!           → SampleSource::acquire_window → BiquadBandpass → EnergyClassifier
//! ```
//!
//! The capture callback does the per-sample legwork (channel downmix,
//! rate conversion, window accumulation); the detection loop only ever
//! handles whole windows.

pub mod convert;
pub mod energy;
pub mod filter;
pub mod source;

pub use convert::convert_chunk;
pub use energy::{Detection, EnergyClassifier};
pub use filter::{BiquadBandpass, FilterCoefficients};
pub use source::{MicSource, SampleSource, SampleWindow, SourceError, WindowAccumulator};

#[cfg(test)]
pub use source::ScriptedSource;
