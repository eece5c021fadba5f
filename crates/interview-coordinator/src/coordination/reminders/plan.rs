use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{Interview, InterviewId};
use super::channels::ChannelKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    ConfirmationRequest,
    PreInterviewReminder,
    PostInterviewFollowUp,
}

impl ReminderKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ConfirmationRequest => "confirmation request",
            Self::PreInterviewReminder => "pre-interview reminder",
            Self::PostInterviewFollowUp => "post-interview follow-up",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
    Skipped,
}

/// One planned notification. `offset_minutes` is relative to the interview
/// start: negative before, positive after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub kind: ReminderKind,
    pub offset_minutes: i64,
    pub scheduled_for: DateTime<Utc>,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub deliveries: BTreeMap<ChannelKind, DeliveryStatus>,
    #[serde(default)]
    pub attempted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl Reminder {
    fn planned(kind: ReminderKind, offset_minutes: i64, scheduled_for: DateTime<Utc>) -> Self {
        Self {
            kind,
            offset_minutes,
            scheduled_for,
            status: DeliveryStatus::Pending,
            deliveries: BTreeMap::new(),
            attempted_at: None,
            acknowledged_at: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == DeliveryStatus::Pending && self.scheduled_for <= now
    }

    /// Record per-channel outcomes and derive the aggregate status.
    pub(crate) fn record_deliveries(
        &mut self,
        deliveries: BTreeMap<ChannelKind, DeliveryStatus>,
        at: DateTime<Utc>,
    ) {
        self.status = if deliveries.values().any(|s| *s == DeliveryStatus::Sent) {
            DeliveryStatus::Sent
        } else if deliveries.values().any(|s| *s == DeliveryStatus::Failed) {
            DeliveryStatus::Failed
        } else {
            DeliveryStatus::Skipped
        };
        self.deliveries = deliveries;
        self.attempted_at = Some(at);
    }
}

/// Ordered reminder plan for one interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderSchedule {
    pub interview_id: InterviewId,
    pub reminders: Vec<Reminder>,
    pub created_at: DateTime<Utc>,
}

impl ReminderSchedule {
    pub fn pending(&self) -> impl Iterator<Item = &Reminder> {
        self.reminders
            .iter()
            .filter(|reminder| reminder.status == DeliveryStatus::Pending)
    }

    pub fn confirmation_request_mut(&mut self) -> Option<&mut Reminder> {
        self.reminders
            .iter_mut()
            .find(|reminder| reminder.kind == ReminderKind::ConfirmationRequest)
    }

    /// Mark every pending entry skipped, used once the interview is terminal.
    pub(crate) fn skip_pending(&mut self) -> usize {
        let mut skipped = 0;
        for reminder in self
            .reminders
            .iter_mut()
            .filter(|reminder| reminder.status == DeliveryStatus::Pending)
        {
            reminder.status = DeliveryStatus::Skipped;
            skipped += 1;
        }
        skipped
    }
}

/// `start` moved by `minutes`, clamped to the representable timeline.
fn shift(start: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    start
        .checked_add_signed(Duration::minutes(minutes))
        .unwrap_or(if minutes < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

/// Offsets used to build reminder plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPolicy {
    /// Hours before the interview start, in any order.
    pub pre_interview_hours: Vec<u32>,
    /// Hours after the interview ends.
    pub follow_up_hours: u32,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            pre_interview_hours: vec![48, 24, 1],
            follow_up_hours: 24,
        }
    }
}

impl ReminderPolicy {
    /// Confirmation request at `now`, pre-interview reminders furthest first,
    /// then the follow-up. Entries already in the past are skipped.
    pub fn build(&self, interview: &Interview, now: DateTime<Utc>) -> ReminderSchedule {
        let start = interview.scheduled_at;
        let mut reminders = Vec::with_capacity(self.pre_interview_hours.len() + 2);

        reminders.push(Reminder::planned(
            ReminderKind::ConfirmationRequest,
            (now - start).num_minutes(),
            now,
        ));

        let mut hours = self.pre_interview_hours.clone();
        hours.sort_unstable_by(|a, b| b.cmp(a));
        hours.dedup();
        for hour in hours {
            let offset = -i64::from(hour) * 60;
            let mut reminder = Reminder::planned(
                ReminderKind::PreInterviewReminder,
                offset,
                shift(start, offset),
            );
            if reminder.scheduled_for < now {
                reminder.status = DeliveryStatus::Skipped;
            }
            reminders.push(reminder);
        }

        let follow_up_offset =
            i64::from(interview.duration_minutes) + i64::from(self.follow_up_hours) * 60;
        let mut follow_up = Reminder::planned(
            ReminderKind::PostInterviewFollowUp,
            follow_up_offset,
            shift(start, follow_up_offset),
        );
        if follow_up.scheduled_for < now {
            follow_up.status = DeliveryStatus::Skipped;
        }
        reminders.push(follow_up);

        ReminderSchedule {
            interview_id: interview.id.clone(),
            reminders,
            created_at: now,
        }
    }
}
