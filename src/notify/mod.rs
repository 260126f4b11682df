//! Push notification on detection.
//!
//! [`PushoverNotifier`] posts the Pushover messages payload so a phone
//! buzzes when the monitor hears a cry. Notification is strictly
//! best-effort: failures are reported and the detection loop continues.
//! All credentials come from [`NotifyConfig`]; nothing is hardcoded.

use thiserror::Error;

use crate::config::NotifyConfig;

// ---------------------------------------------------------------------------
// NotifyError
// ---------------------------------------------------------------------------

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP transport or connection error.
    #[error("notification request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("notification request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("notification rejected by server (HTTP {0})")]
    Rejected(u16),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NotifyError::Timeout
        } else {
            NotifyError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Notifier trait
// ---------------------------------------------------------------------------

/// Best-effort out-of-band notification channel.
pub trait Notifier: Send {
    /// Deliver a short notification. Blocking, bounded by the transport's
    /// configured timeout.
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// PushoverNotifier
// ---------------------------------------------------------------------------

const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

/// [`Notifier`] backed by the Pushover messages API.
pub struct PushoverNotifier {
    client: reqwest::blocking::Client,
    user_key: String,
    api_token: String,
    endpoint: String,
}

impl PushoverNotifier {
    /// Build a notifier from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`; a default client is the last-resort fallback
    /// if the builder fails (should never happen in practice).
    pub fn from_config(config: &NotifyConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            client,
            user_key: config.user_key.clone(),
            api_token: config.api_token.clone(),
            endpoint: PUSHOVER_ENDPOINT.to_string(),
        }
    }
}

impl Notifier for PushoverNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let body = serde_json::json!({
            "token":   self.api_token,
            "user":    self.user_key,
            "title":   title,
            "message": message,
        });

        let response = self.client.post(&self.endpoint).json(&body).send()?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> NotifyConfig {
        NotifyConfig {
            enabled: true,
            user_key: "uk-test".into(),
            api_token: "at-test".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _notifier = PushoverNotifier::from_config(&make_config());
    }

    #[test]
    fn notifier_is_object_safe() {
        let notifier: Box<dyn Notifier> = Box::new(PushoverNotifier::from_config(&make_config()));
        // No request is sent here; constructing the trait object is the test.
        let _ = &notifier;
    }

    #[test]
    fn error_display_includes_status_code() {
        let e = NotifyError::Rejected(429);
        assert!(e.to_string().contains("429"));
    }
}
