// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound email notifications.
//!
//! Delivery is best-effort: sharing never fails because a notification did.

#[cfg(test)]
use std::sync::Mutex;

/// Error returned by a [`Notifier`] backend.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("no recipients")]
    NoRecipients,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Email sink. Implementations must not block for long; callers do not retry.
pub trait Notifier: Send + Sync {
    fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of sending mail.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), NotifyError> {
        if to.is_empty() {
            return Err(NotifyError::NoRecipients);
        }
        tracing::info!(
            recipients = to.len(),
            subject = %subject,
            body_len = body.len(),
            "Notification dispatched"
        );
        Ok(())
    }
}

/// Send and swallow failures with a warning.
pub fn send_best_effort(notifier: &dyn Notifier, to: &[String], subject: &str, body: &str) {
    if let Err(e) = notifier.send(to, subject, body) {
        tracing::warn!(error = %e, subject = %subject, "Notification not delivered");
    }
}

/// Captures messages in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    fail: bool,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier that rejects every message.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Delivery("smtp unavailable".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMessage {
                to: to.to_vec(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        }
        Ok(())
    }
}
