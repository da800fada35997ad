//! Concrete, time-bounded event instances.

use std::sync::Arc;

use chrono::Duration;

use crate::calendar::Calendar;
use crate::timestamp::ResolvedTimestamp;

/// One instance of an event (recurring or not) inside a query window.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    /// Shared by every instance of the same recurring event.
    pub uid: String,
    pub summary: String,
    pub start: ResolvedTimestamp,
    pub end: Option<ResolvedTimestamp>,
    pub calendar: Option<Arc<Calendar>>,
}

impl Occurrence {
    pub fn duration(&self) -> Option<Duration> {
        self.end
            .as_ref()
            .map(|end| end.instant() - self.start.instant())
    }

    pub fn calendar_name(&self) -> &str {
        self.calendar.as_deref().map(|c| c.name.as_str()).unwrap_or_default()
    }
}
