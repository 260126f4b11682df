//! Detection loop state machine.
//!
//! [`MonitorState`] tracks what the single control thread is doing. The
//! transitions are:
//!
//! ```text
//! Idle ──verdict=true──────────▶ Alerting
//! Alerting ──melody ends───────▶ Idle
//! Alerting ──button interrupt──▶ Idle   (melody stopped early)
//! Idle / Alerting ──"desligar"─▶ Suspended
//! Suspended ──"ligar"──────────▶ Idle
//! ```
//!
//! Interruption is not a state of its own: the button cuts the melody and
//! the loop lands straight back in `Idle`.

// ---------------------------------------------------------------------------
// MonitorState
// ---------------------------------------------------------------------------

/// States of the cry-detection loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Sampling and monitoring.
    Idle,

    /// A cry was confirmed; the melody is the sole foreground activity.
    /// No re-acquisition happens until it ends or is interrupted.
    Alerting,

    /// Monitoring switched off by remote command; only commands are
    /// serviced.
    Suspended,
}

impl MonitorState {
    /// Returns `true` while the loop is acquiring and classifying windows.
    pub fn is_monitoring(&self) -> bool {
        matches!(self, MonitorState::Idle)
    }

    /// Short label for logs and status replies.
    pub fn label(&self) -> &'static str {
        match self {
            MonitorState::Idle => "monitorando",
            MonitorState::Alerting => "alertando",
            MonitorState::Suspended => "desligado",
        }
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        MonitorState::Idle
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_monitoring() {
        assert!(MonitorState::Idle.is_monitoring());
    }

    #[test]
    fn alerting_is_not_monitoring() {
        assert!(!MonitorState::Alerting.is_monitoring());
    }

    #[test]
    fn suspended_is_not_monitoring() {
        assert!(!MonitorState::Suspended.is_monitoring());
    }

    #[test]
    fn labels_are_distinct() {
        let labels = [
            MonitorState::Idle.label(),
            MonitorState::Alerting.label(),
            MonitorState::Suspended.label(),
        ];
        assert_eq!(
            labels.len(),
            labels.iter().collect::<std::collections::HashSet<_>>().len()
        );
    }

    #[test]
    fn default_state_is_idle() {
        assert_eq!(MonitorState::default(), MonitorState::Idle);
    }
}
