//! The stop button: a level-triggered interrupt flag and its listener.
//!
//! The original device wired a physical push button to a GPIO pin; the
//! host build watches a global keyboard key instead. Either way the
//! contract is the same: the input layer delivers a clean boolean, and
//! the handler's only permitted action is to set the [`InterruptFlag`].
//! All reaction logic stays in the single control thread, which polls the
//! flag between melody poll intervals.

pub mod listener;

pub use listener::ButtonListener;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// InterruptFlag
// ---------------------------------------------------------------------------

/// Clonable level-triggered stop signal.
///
/// Set by the button listener thread, read and cleared by the control
/// loop and the melody player. This is the only piece of state shared
/// across threads; everything else is owned by the loop.
#[derive(Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    /// Create a cleared flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Safe to call from any thread or handler context.
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Lower the flag. Called by the loop when entering a new alert so a
    /// stale press cannot cancel it.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    /// Current level.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse the configured stop-key name into an [`rdev::Key`].
///
/// Supports the function keys plus a handful of named keys that make
/// sensible stop buttons. Returns `None` for unrecognised names so the
/// caller can disable the button with a warning instead of guessing.
///
/// ```
/// use acalanto::button::parse_key;
///
/// assert_eq!(parse_key("F12"), Some(rdev::Key::F12));
/// assert_eq!(parse_key("Space"), Some(rdev::Key::Space));
/// assert_eq!(parse_key("volume-knob"), None);
/// ```
pub fn parse_key(name: &str) -> Option<rdev::Key> {
    let key = match name {
        "F1" => rdev::Key::F1,
        "F2" => rdev::Key::F2,
        "F3" => rdev::Key::F3,
        "F4" => rdev::Key::F4,
        "F5" => rdev::Key::F5,
        "F6" => rdev::Key::F6,
        "F7" => rdev::Key::F7,
        "F8" => rdev::Key::F8,
        "F9" => rdev::Key::F9,
        "F10" => rdev::Key::F10,
        "F11" => rdev::Key::F11,
        "F12" => rdev::Key::F12,
        "Escape" | "Esc" => rdev::Key::Escape,
        "Space" => rdev::Key::Space,
        "Return" | "Enter" => rdev::Key::Return,
        "Pause" => rdev::Key::Pause,
        "Insert" => rdev::Key::Insert,
        "Delete" | "Del" => rdev::Key::Delete,
        "Home" => rdev::Key::Home,
        "End" => rdev::Key::End,
        _ => return None,
    };
    Some(key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
