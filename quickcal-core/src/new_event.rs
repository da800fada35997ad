//! Events created from the command line.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::error::QuickCalResult;
use crate::ics;

/// When a new event happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventWhen {
    /// A whole day.
    AllDay(NaiveDate),
    /// A one-hour slot starting at this local time.
    Timed(NaiveDateTime),
}

/// An event about to be written to a calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub summary: String,
    pub when: EventWhen,
    /// Reminders, each this long before the start.
    pub alarms: Vec<Duration>,
}

impl NewEvent {
    pub fn new(summary: &str, when: EventWhen) -> Self {
        NewEvent {
            summary: summary.to_string(),
            when,
            alarms: Vec::new(),
        }
    }

    pub fn with_alarm(mut self, before: Duration) -> Self {
        self.alarms.push(before);
        self
    }

    /// Render as a VCALENDAR resource. Local times are interpreted in `tz`.
    pub fn to_ics(&self, uid: &str, tz: Tz, now: DateTime<Utc>) -> QuickCalResult<String> {
        ics::generate_ics(self, uid, tz, now)
    }
}

/// Fresh UID for a new event.
pub fn new_uid() -> String {
    uuid::Uuid::new_v4().to_string()
}
