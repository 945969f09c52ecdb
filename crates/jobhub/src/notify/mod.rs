//! Outbound e-mail and SMS notifications.
//!
//! Services hand notifications to a [`Notifier`]. In the running service that
//! is a [`NotificationDispatcher`], which owns a background worker thread so
//! request handlers never wait on a mail or SMS provider.

mod dispatcher;

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

pub use dispatcher::NotificationDispatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    pub const fn label(self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub channel: Channel,
    pub destination: String,
    pub template: String,
    pub body: String,
}

impl Notification {
    pub fn new(
        channel: Channel,
        destination: impl Into<String>,
        template: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            destination: destination.into(),
            template: template.into(),
            body: body.into(),
        }
    }

    pub fn email(
        destination: impl Into<String>,
        template: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::new(Channel::Email, destination, template, body)
    }
}

/// Entry point used by services to emit notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Provider adapter invoked from the dispatcher's worker thread.
pub trait NotificationTransport: Send + 'static {
    fn deliver(&mut self, notification: &Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification queue is closed")]
    Closed,
    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Transport that only writes deliveries to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

impl NotificationTransport for LogTransport {
    fn deliver(&mut self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            channel = notification.channel.label(),
            destination = %notification.destination,
            template = %notification.template,
            "notification delivered"
        );
        Ok(())
    }
}

/// Shared in-memory outbox usable both as a transport and as a synchronous notifier.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    deliveries: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn deliveries(&self) -> Vec<Notification> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent notification sent to `destination` with `template`.
    pub fn last_to(&self, destination: &str, template: &str) -> Option<Notification> {
        self.deliveries()
            .into_iter()
            .rev()
            .find(|n| n.destination == destination && n.template == template)
    }

    fn push(&self, notification: Notification) {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.push(notification);
        Ok(())
    }
}

impl NotificationTransport for RecordingNotifier {
    fn deliver(&mut self, notification: &Notification) -> Result<(), NotifyError> {
        self.push(notification.clone());
        Ok(())
    }
}

/// Pull the first run of six digits out of a notification body.
pub fn extract_code(body: &str) -> Option<String> {
    body.split(|c: char| !c.is_ascii_digit())
        .find(|chunk| chunk.len() == 6)
        .map(str::to_string)
}
