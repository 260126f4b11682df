//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.
//!
//! Configuration is loaded once at startup and immutable afterwards; the
//! detection loop holds no reconfiguration path. [`AppConfig::validate`]
//! runs before the loop starts and a failure there is fatal by design: a
//! monitor with a zero-length window or an unstable filter would produce
//! nonsensical detections, which is worse than refusing to start.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::FilterCoefficients;
use crate::melody::{build_melody, Note};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Fatal configuration problems, checked once at startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("sample rate must be positive")]
    ZeroSampleRate,

    #[error("sampling window must contain at least one sample")]
    EmptyWindow,

    #[error("detection threshold must be positive")]
    NonPositiveThreshold,

    #[error("bandpass coefficients are unstable or not finite")]
    UnstableFilter,

    #[error("melody volume must be 0-100, got {0}")]
    VolumeOutOfRange(u8),

    #[error("melody table is empty")]
    EmptyMelody,

    #[error("melody note durations must be positive")]
    NonPositiveNoteDuration,

    #[error("unknown melody note: {0}")]
    UnknownNote(String),

    #[error("pushover notifications enabled but credentials are missing")]
    MissingPushoverCredentials,
}

// ---------------------------------------------------------------------------
// SamplingConfig
// ---------------------------------------------------------------------------

/// Acquisition cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Analysis sample rate in Hz.
    pub sample_rate: u32,
    /// Duration of each acquisition window in seconds.
    pub window_secs: f32,
    /// Pause between detection cycles in seconds.
    pub pause_secs: f32,
    /// Refresh the idle status line every this many cycles (reduces
    /// display churn; 1 means every cycle).
    pub idle_refresh_cycles: u32,
}

impl SamplingConfig {
    /// Number of samples in one acquisition window.
    pub fn window_samples(&self) -> usize {
        (self.sample_rate as f64 * self.window_secs as f64) as usize
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            window_secs: 2.0,
            pause_secs: 2.0,
            idle_refresh_cycles: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// DetectionConfig
// ---------------------------------------------------------------------------

/// Energy-threshold settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Mean-square energy above which a window counts as a cry.
    pub threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { threshold: 1e-3 }
    }
}

// ---------------------------------------------------------------------------
// MelodyConfig
// ---------------------------------------------------------------------------

/// One `(note, duration)` entry of the melody table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodyEntry {
    /// Note name from the table in [`crate::melody::note_freq`].
    pub note: String,
    /// Duration in seconds.
    pub secs: f32,
}

impl MelodyEntry {
    fn new(note: &str, secs: f32) -> Self {
        Self {
            note: note.into(),
            secs,
        }
    }
}

/// Melody playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MelodyConfig {
    /// Playback volume, 0-100 percent.
    pub volume: u8,
    /// The melody, played in order on each confirmed detection.
    pub notes: Vec<MelodyEntry>,
}

impl MelodyConfig {
    /// Resolve the configured table into playable [`Note`]s.
    pub fn to_melody(&self) -> Result<Vec<Note>, ConfigError> {
        build_melody(self.notes.iter().map(|e| (e.note.as_str(), e.secs)))
            .map_err(|e| ConfigError::UnknownNote(e.0))
    }
}

impl Default for MelodyConfig {
    fn default() -> Self {
        // The lullaby the original device shipped with.
        let notes = vec![
            MelodyEntry::new("C4", 0.5),
            MelodyEntry::new("D4", 0.5),
            MelodyEntry::new("E4", 0.5),
            MelodyEntry::new("F4", 0.5),
            MelodyEntry::new("G4", 0.5),
            MelodyEntry::new("G4", 0.5),
            MelodyEntry::new("A4", 0.5),
            MelodyEntry::new("G4", 1.0),
            MelodyEntry::new("G4", 0.5),
            MelodyEntry::new("F4", 0.5),
            MelodyEntry::new("E4", 0.5),
            MelodyEntry::new("D4", 0.5),
            MelodyEntry::new("E4", 0.5),
            MelodyEntry::new("F4", 0.5),
            MelodyEntry::new("G4", 1.0),
            MelodyEntry::new("C4", 0.5),
            MelodyEntry::new("D4", 0.5),
            MelodyEntry::new("E4", 0.5),
            MelodyEntry::new("F4", 0.5),
            MelodyEntry::new("G4", 0.5),
            MelodyEntry::new("G4", 0.5),
            MelodyEntry::new("A4", 0.5),
            MelodyEntry::new("G4", 1.0),
            MelodyEntry::new("G4", 0.5),
            MelodyEntry::new("F4", 0.5),
            MelodyEntry::new("E4", 0.5),
            MelodyEntry::new("D4", 0.5),
            MelodyEntry::new("C4", 0.5),
            MelodyEntry::new("C4", 1.0),
        ];

        Self { volume: 40, notes }
    }
}

// ---------------------------------------------------------------------------
// ButtonConfig
// ---------------------------------------------------------------------------

/// Stop-button settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonConfig {
    /// Key name watched as the stop button (see
    /// [`crate::button::parse_key`]).
    pub stop_key: String,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            stop_key: "F12".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// NotifyConfig
// ---------------------------------------------------------------------------

/// Pushover notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Whether detections trigger a push notification.
    pub enabled: bool,
    /// Pushover user key.
    pub user_key: String,
    /// Pushover application token.
    pub api_token: String,
    /// Maximum seconds to wait for the notification request.
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            user_key: String::new(),
            api_token: String::new(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialized as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use acalanto::config::AppConfig;
///
/// // Load (returns Default when the file is missing)
/// let config = AppConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Acquisition cadence.
    pub sampling: SamplingConfig,
    /// Bandpass coefficient set.
    pub filter: FilterCoefficients,
    /// Energy threshold.
    pub detection: DetectionConfig,
    /// Melody table and volume.
    pub melody: MelodyConfig,
    /// Stop-button key.
    pub button: ButtonConfig,
    /// Pushover notification.
    pub notify: NotifyConfig,
}

impl AppConfig {
    /// Load configuration from the platform `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform `settings.toml`, creating parent
    /// directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every invariant the detection loop depends on.
    ///
    /// Called once at startup; any failure must prevent the loop from
    /// starting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.sampling.window_samples() == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        // `!(x > 0)` also catches NaN thresholds.
        if !(self.detection.threshold > 0.0) {
            return Err(ConfigError::NonPositiveThreshold);
        }
        if !self.filter.is_stable() {
            return Err(ConfigError::UnstableFilter);
        }
        if self.melody.volume > 100 {
            return Err(ConfigError::VolumeOutOfRange(self.melody.volume));
        }
        if self.melody.notes.is_empty() {
            return Err(ConfigError::EmptyMelody);
        }
        if self.melody.notes.iter().any(|e| !(e.secs > 0.0)) {
            return Err(ConfigError::NonPositiveNoteDuration);
        }
        self.melody.to_melody()?;
        if self.notify.enabled
            && (self.notify.user_key.is_empty() || self.notify.api_token.is_empty())
        {
            return Err(ConfigError::MissingPushoverCredentials);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
