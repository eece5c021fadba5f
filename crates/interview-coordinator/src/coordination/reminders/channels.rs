use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{ApplicationId, InterviewId};
use super::plan::ReminderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Email,
    Sms,
    Push,
    InApp,
}

impl ChannelKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Push => "push",
            Self::InApp => "in_app",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payload handed to every outbound channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub interview_id: InterviewId,
    pub application_id: ApplicationId,
    pub kind: ReminderKind,
    pub scheduled_at: DateTime<Utc>,
    pub time_zone: String,
    pub subject: String,
    pub body: String,
}

/// Outbound delivery hook (e-mail gateway, SMS provider, push service, in-app feed).
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;
    fn send(&self, notification: &Notification) -> Result<(), NotificationError>;

    /// Channels that are switched off are recorded as skipped, not failed.
    fn is_available(&self) -> bool {
        true
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("{channel} delivery failed: {reason}")]
    DeliveryFailed { channel: ChannelKind, reason: String },
}
