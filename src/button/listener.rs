//! Dedicated OS-thread button listener using `rdev::listen`.
//!
//! `rdev::listen` is a blocking call that must live on its own OS thread.
//! [`ButtonListener`] owns that thread and a stop flag; dropping it sets
//! the flag so the callback ignores further key events.
//!
//! The callback obeys the interrupt-handler rule: on a matching key press
//! it sets the [`InterruptFlag`] and does nothing else. No blocking, no
//! computation; the control loop reacts on its own schedule.
//!
//! # Shutdown caveat
//!
//! `rdev::listen` has no graceful shutdown API. Setting the stop flag
//! prevents further flag raises, but the OS thread stays blocked in the
//! rdev event loop until the process exits. rdev holds no resources that
//! need explicit cleanup, so this is acceptable for a daemon that runs
//! until killed.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use super::InterruptFlag;

// ---------------------------------------------------------------------------
// ButtonListener
// ---------------------------------------------------------------------------

/// Handle to a running button listener thread.
///
/// Construct with [`ButtonListener::start`]. Drop it to stop raising the
/// interrupt flag.
pub struct ButtonListener {
    /// Shared stop flag, set on [`Drop`].
    stop: Arc<AtomicBool>,
    /// Kept so the thread is not detached prematurely; never joined
    /// because `rdev::listen` never returns.
    _thread: std::thread::JoinHandle<()>,
}

impl ButtonListener {
    /// Spawn a dedicated OS thread that raises `flag` whenever `key` is
    /// pressed.
    ///
    /// Debouncing is the platform input layer's concern; by the time an
    /// event reaches the callback it is a clean press.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the thread (extremely unlikely).
    pub fn start(key: rdev::Key, flag: InterruptFlag) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("button-listener".into())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }

                    if let rdev::EventType::KeyPress(k) = event.event_type {
                        if k == key {
                            // Handler rule: set the flag, nothing more.
                            flag.set();
                        }
                    }
                });

                if let Err(e) = result {
                    log::error!("button-listener: rdev::listen exited with error: {:?}", e);
                }
            })
            .expect("failed to spawn button-listener thread");

        Self {
            stop,
            _thread: thread,
        }
    }
}

impl Drop for ButtonListener {
    /// Set the stop flag so the rdev callback stops raising interrupts.
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
