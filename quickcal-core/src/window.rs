//! Query windows for listing occurrences.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{QuickCalError, QuickCalResult};
use crate::timestamp::ResolvedTimestamp;

/// Span used when no `--to` is given.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Inclusive instant range `[from, to]`. `from <= to` is up to the caller.
///
/// `zone` is the timezone the window was typed in. All-day values carry no zone
/// of their own and are placed at midnight in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub zone: Tz,
}

impl QueryWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        QueryWindow {
            from,
            to,
            zone: chrono_tz::UTC,
        }
    }

    pub fn in_zone(self, zone: Tz) -> Self {
        QueryWindow { zone, ..self }
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.from && instant <= self.to
    }

    /// Zoned values are compared by instant, dates by their midnight in `zone`.
    pub fn contains_timestamp(&self, timestamp: &ResolvedTimestamp) -> bool {
        match timestamp {
            ResolvedTimestamp::Date(date) => self.contains(self.midnight(*date)),
            ResolvedTimestamp::DateTime(_) => self.contains(timestamp.instant()),
        }
    }

    /// Bounds to expand a series anchored at `anchor` with.
    ///
    /// Date-only series expand at midnight UTC, which can sit up to a day away
    /// from midnight in `zone`. Callers re-check with [`Self::contains_timestamp`].
    pub fn expansion_bounds(&self, anchor: &ResolvedTimestamp) -> QueryWindow {
        if anchor.is_all_day() && self.zone != chrono_tz::UTC {
            QueryWindow {
                from: self.from - Duration::days(1),
                to: self.to + Duration::days(1),
                zone: self.zone,
            }
        } else {
            *self
        }
    }

    fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        start_of_day(date, self.zone).unwrap_or_else(|_| date.and_time(NaiveTime::MIN).and_utc())
    }

    /// Build a window from command-line dates (`dd/mm` or `dd/mm/yyyy`).
    /// - `from`: start of that day in `tz`, defaults to `now`
    /// - `to`: end of that day (23:59:59) in `tz`, defaults to `from` + 7 days
    pub fn from_args(
        from: Option<&str>,
        to: Option<&str>,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> QuickCalResult<Self> {
        let today = now.with_timezone(&tz).date_naive();

        let from_dt = match from {
            Some(s) => start_of_day(parse_input_date(s, today.year())?, tz)?,
            None => now,
        };

        let to_dt = match to {
            Some(s) => end_of_day(parse_input_date(s, today.year())?, tz)?,
            None => from_dt + Duration::days(DEFAULT_WINDOW_DAYS),
        };

        Ok(QueryWindow::new(from_dt, to_dt).in_zone(tz))
    }

    /// CalDAV `time-range` formatting of both bounds (`YYYYMMDDTHHMMSSZ`).
    pub fn caldav_bounds(&self) -> (String, String) {
        (
            self.from.format("%Y%m%dT%H%M%SZ").to_string(),
            self.to.format("%Y%m%dT%H%M%SZ").to_string(),
        )
    }
}

/// Parse `dd/mm` (assuming `current_year`) or `dd/mm/yyyy`.
pub fn parse_input_date(s: &str, current_year: i32) -> QuickCalResult<NaiveDate> {
    let s = s.trim();
    let full = match s.split('/').count() {
        2 => format!("{}/{}", s, current_year),
        _ => s.to_string(),
    };

    NaiveDate::parse_from_str(&full, "%d/%m/%Y").map_err(|_| {
        QuickCalError::InvalidInput(format!(
            "Invalid date '{}'. Expected dd/mm or dd/mm/yyyy",
            s
        ))
    })
}

/// Parse `hh:mm`.
pub fn parse_input_time(s: &str) -> QuickCalResult<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| {
        QuickCalError::InvalidInput(format!("Invalid time '{}'. Expected hh:mm", s.trim()))
    })
}

/// Combine a date and time typed by the user.
pub fn parse_input_date_time(
    date: &str,
    time: &str,
    current_year: i32,
) -> QuickCalResult<NaiveDateTime> {
    Ok(parse_input_date(date, current_year)?.and_time(parse_input_time(time)?))
}

fn start_of_day(date: NaiveDate, tz: Tz) -> QuickCalResult<DateTime<Utc>> {
    local_instant(date.and_time(NaiveTime::MIN), tz)
}

fn end_of_day(date: NaiveDate, tz: Tz) -> QuickCalResult<DateTime<Utc>> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    local_instant(date.and_time(last_second), tz)
}

fn local_instant(local: NaiveDateTime, tz: Tz) -> QuickCalResult<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| QuickCalError::InvalidInput(format!("{} does not exist in {}", local, tz)))
}
