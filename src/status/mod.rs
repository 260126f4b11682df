//! Status sinks — the two-line display and the indicator LED.
//!
//! The detection core only knows these narrow contracts; any concrete
//! panel or LED driver satisfies them. Both are best-effort: a sink may
//! drop output, but it must never block the detection loop beyond a
//! bounded render time.

use std::time::Duration;

// ---------------------------------------------------------------------------
// StatusDisplay
// ---------------------------------------------------------------------------

/// Two-line status output, the whole display contract the loop relies on.
///
/// Typical payloads: `("Monitorando", "")` while idle and
/// `("Choro detectado!", "")` on detection.
pub trait StatusDisplay {
    /// Replace the display contents with the given lines. Best-effort;
    /// no acknowledgment.
    fn show(&mut self, line1: &str, line2: &str);
}

// ---------------------------------------------------------------------------
// LedIndicator
// ---------------------------------------------------------------------------

/// Indicator LED driven with a blink pattern on detection.
pub trait LedIndicator {
    /// Blink `times` times, holding each on and off phase for `period`.
    fn blink(&mut self, times: u32, period: Duration);
}

// ---------------------------------------------------------------------------
// Console implementations
// ---------------------------------------------------------------------------

/// Log-backed [`StatusDisplay`] for the host binary.
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl StatusDisplay for ConsoleDisplay {
    fn show(&mut self, line1: &str, line2: &str) {
        if line2.is_empty() {
            log::info!("[display] {line1}");
        } else {
            log::info!("[display] {line1} | {line2}");
        }
    }
}

/// Log-backed [`LedIndicator`] for the host binary.
///
/// Reports the pattern instead of sleeping through it; the bounded-time
/// rule matters more than a faithful light show on a headless host.
#[derive(Debug, Default)]
pub struct ConsoleLed;

impl ConsoleLed {
    pub fn new() -> Self {
        Self
    }
}

impl LedIndicator for ConsoleLed {
    fn blink(&mut self, times: u32, period: Duration) {
        log::info!("[led] blink x{times} ({} ms on/off)", period.as_millis());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
