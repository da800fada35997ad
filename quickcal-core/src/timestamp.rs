//! Resolution of DTSTART/DTEND/EXDATE values into absolute instants.
//!
//! Two representations are accepted:
//! - `TZID=<zone>` with a local date-time (`20250601T090000`), resolved in that zone
//! - `VALUE=DATE` with a calendar date (`20250610`), resolved to midnight UTC
//!
//! Anything else (including UTC `...Z` values without a TZID) is rejected rather
//! than guessed at.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{QuickCalError, QuickCalResult};
use crate::ics::{DATE_LAYOUT, DATE_TIME_LAYOUT, PARAM_TZID, PARAM_VALUE, Property, VALUE_DATE};

/// An absolute instant plus how it was written in the calendar data.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTimestamp {
    /// All-day value; stands for midnight of that day.
    Date(NaiveDate),
    /// Date-time resolved in its named zone.
    DateTime(DateTime<Tz>),
}

impl ResolvedTimestamp {
    /// The absolute instant. Dates resolve to midnight UTC of that day, independent
    /// of the process's local timezone.
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            ResolvedTimestamp::Date(d) => d.and_time(chrono::NaiveTime::MIN).and_utc(),
            ResolvedTimestamp::DateTime(dt) => dt.with_timezone(&Utc),
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, ResolvedTimestamp::Date(_))
    }

    /// Represent `instant` the same way `self` is represented (date or same zone).
    pub fn like(&self, instant: DateTime<Utc>) -> ResolvedTimestamp {
        match self {
            ResolvedTimestamp::Date(_) => ResolvedTimestamp::Date(instant.date_naive()),
            ResolvedTimestamp::DateTime(dt) => {
                ResolvedTimestamp::DateTime(instant.with_timezone(&dt.timezone()))
            }
        }
    }

    /// Shift by an absolute duration, keeping the representation.
    pub fn shifted(&self, duration: Duration) -> ResolvedTimestamp {
        self.like(self.instant() + duration)
    }
}

impl fmt::Display for ResolvedTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedTimestamp::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            ResolvedTimestamp::DateTime(dt) => {
                write!(f, "{} {}", dt.format("%Y-%m-%d %H:%M"), dt.timezone().name())
            }
        }
    }
}

/// Resolve a single-valued timestamp property.
pub fn resolve(prop: &Property) -> QuickCalResult<ResolvedTimestamp> {
    resolve_value(prop, prop.value.trim())
}

/// Resolve a possibly comma-separated multi-value property (EXDATE).
pub fn resolve_list(prop: &Property) -> QuickCalResult<Vec<ResolvedTimestamp>> {
    prop.value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| resolve_value(prop, v))
        .collect()
}

fn resolve_value(prop: &Property, value: &str) -> QuickCalResult<ResolvedTimestamp> {
    if let Some(tzid) = prop.param(PARAM_TZID) {
        let tz: Tz = tzid.parse().map_err(|e| unparseable(value, format!("unknown timezone '{tzid}': {e}")))?;
        let local = NaiveDateTime::parse_from_str(value, DATE_TIME_LAYOUT)
            .map_err(|e| unparseable(value, e.to_string()))?;
        // DST fold: take the earlier instant. DST gap: the local time does not exist.
        let resolved = tz
            .from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| unparseable(value, format!("local time does not exist in {tzid}")))?;
        return Ok(ResolvedTimestamp::DateTime(resolved));
    }

    if prop
        .param(PARAM_VALUE)
        .is_some_and(|v| v.eq_ignore_ascii_case(VALUE_DATE))
    {
        let date = NaiveDate::parse_from_str(value, DATE_LAYOUT)
            .map_err(|e| unparseable(value, e.to_string()))?;
        return Ok(ResolvedTimestamp::Date(date));
    }

    Err(QuickCalError::UnrecognizedTimestamp {
        property: prop.name.clone(),
        value: value.to_string(),
    })
}

fn unparseable(value: &str, reason: String) -> QuickCalError {
    QuickCalError::UnparseableTimestamp {
        value: value.to_string(),
        reason,
    }
}
