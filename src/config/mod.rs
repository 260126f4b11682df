//! Configuration for the cry monitor.
//!
//! Provides [`AppConfig`] (top-level settings), sub-configs for each
//! subsystem, [`AppPaths`] for platform path resolution, and the fatal
//! [`ConfigError`] taxonomy checked once at startup. Everything is loaded
//! at boot and immutable afterwards.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, ButtonConfig, ConfigError, DetectionConfig, MelodyConfig, MelodyEntry,
    NotifyConfig, SamplingConfig,
};
