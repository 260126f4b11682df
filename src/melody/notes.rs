//! Note names, frequencies and melody construction.
//!
//! Melodies are configured as `(note name, duration)` pairs; this module
//! resolves the names against a small equal-temperament table and produces
//! the [`Note`] sequence the player consumes.

use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Note
// ---------------------------------------------------------------------------

/// One melody step: a pitch and how long to hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Fundamental frequency in Hz.
    pub freq_hz: u16,
    /// How long the note sounds.
    pub duration: Duration,
}

impl Note {
    pub fn new(freq_hz: u16, duration: Duration) -> Self {
        Self { freq_hz, duration }
    }
}

// ---------------------------------------------------------------------------
// note_freq
// ---------------------------------------------------------------------------

/// Map a note name to its frequency in Hz.
///
/// Covers the single octave the lullaby table uses (C4 through C5).
/// Returns `None` for unknown names so configuration validation can
/// reject them before the loop starts.
///
/// ```
/// use acalanto::melody::note_freq;
///
/// assert_eq!(note_freq("A4"), Some(440));
/// assert_eq!(note_freq("C5"), Some(523));
/// assert_eq!(note_freq("H9"), None);
/// ```
pub fn note_freq(name: &str) -> Option<u16> {
    match name {
        "C4" => Some(262),
        "D4" => Some(294),
        "E4" => Some(330),
        "F4" => Some(349),
        "G4" => Some(392),
        "A4" => Some(440),
        "B4" => Some(494),
        "C5" => Some(523),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// UnknownNote / build_melody
// ---------------------------------------------------------------------------

/// A melody entry referenced a note name missing from the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown melody note: {0}")]
pub struct UnknownNote(pub String);

/// Resolve `(name, seconds)` pairs into playable [`Note`]s.
///
/// Fails on the first unknown name; durations are taken as-is (the
/// configuration layer rejects non-positive values before this runs).
pub fn build_melody<'a, I>(entries: I) -> Result<Vec<Note>, UnknownNote>
where
    I: IntoIterator<Item = (&'a str, f32)>,
{
    entries
        .into_iter()
        .map(|(name, secs)| {
            let freq_hz = note_freq(name).ok_or_else(|| UnknownNote(name.to_string()))?;
            Ok(Note::new(freq_hz, Duration::from_secs_f32(secs)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
