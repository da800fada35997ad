//! RRULE evaluation.
//!
//! The projector asks a [`RecurrenceEvaluator`] for the instants of a rule inside a
//! window. [`RRuleEvaluator`] is the implementation backed by the `rrule` crate.

use chrono::{DateTime, Duration, Utc};
use rrule::RRuleSet;
use tracing::warn;

use crate::error::{QuickCalError, QuickCalResult};
use crate::timestamp::ResolvedTimestamp;
use crate::window::QueryWindow;

/// Upper bound on instants materialized for one event in one window.
pub const MAX_EXPANDED_INSTANCES: u16 = 1000;

/// One recurring event to expand.
#[derive(Debug, Clone, Copy)]
pub struct Expansion<'a> {
    pub uid: &'a str,
    /// RRULE value, e.g. `FREQ=DAILY;COUNT=5`
    pub rule: &'a str,
    /// The event's resolved DTSTART.
    pub anchor: &'a ResolvedTimestamp,
    pub exdates: &'a [ResolvedTimestamp],
}

/// Produces the occurrence instants of a rule within `[window.from, window.to]`.
pub trait RecurrenceEvaluator {
    fn between(
        &self,
        expansion: &Expansion<'_>,
        window: &QueryWindow,
    ) -> QuickCalResult<Vec<DateTime<Utc>>>;
}

/// Evaluator backed by the `rrule` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RRuleEvaluator;

impl RecurrenceEvaluator for RRuleEvaluator {
    fn between(
        &self,
        expansion: &Expansion<'_>,
        window: &QueryWindow,
    ) -> QuickCalResult<Vec<DateTime<Utc>>> {
        let rrule_str = build_rrule_string(expansion);

        let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| QuickCalError::RecurrenceRule {
            uid: expansion.uid.to_string(),
            reason: format!("{}", e),
        })?;

        // after/before are exclusive; widen by a second so both bounds are included.
        let tz: rrule::Tz = Utc.into();
        let after = (window.from - Duration::seconds(1)).with_timezone(&tz);
        let before = (window.to + Duration::seconds(1)).with_timezone(&tz);

        let result = rrule_set.after(after).before(before).all(MAX_EXPANDED_INSTANCES);

        if result.limited {
            warn!(
                uid = expansion.uid,
                limit = MAX_EXPANDED_INSTANCES,
                "Recurrence expansion truncated"
            );
        }

        Ok(result.dates.iter().map(|dt| dt.with_timezone(&Utc)).collect())
    }
}

/// Build an iCalendar-format DTSTART/RRULE/EXDATE block for the rrule crate parser.
fn build_rrule_string(expansion: &Expansion<'_>) -> String {
    let mut lines = vec![
        ics_time_line("DTSTART", expansion.anchor),
        format!("RRULE:{}", rule_for_anchor(expansion.rule.trim(), expansion.anchor)),
    ];

    for exdate in expansion.exdates {
        lines.push(ics_time_line("EXDATE", exdate));
    }

    lines.join("\n")
}

/// All-day series carry a date-only UNTIL. Once DTSTART is moved to midnight UTC the
/// rrule crate wants UNTIL in UTC too, so `UNTIL=YYYYMMDD` gains `T000000Z`.
fn rule_for_anchor(rule: &str, anchor: &ResolvedTimestamp) -> String {
    if !anchor.is_all_day() {
        return rule.to_string();
    }

    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value))
                if key.trim().eq_ignore_ascii_case("UNTIL")
                    && value.len() == 8
                    && value.bytes().all(|b| b.is_ascii_digit()) =>
            {
                format!("{}={}T000000Z", key, value)
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// The rrule crate needs a date-time, so all-day values become midnight UTC.
fn ics_time_line(name: &str, time: &ResolvedTimestamp) -> String {
    match time {
        ResolvedTimestamp::Date(d) => format!("{}:{}T000000Z", name, d.format("%Y%m%d")),
        ResolvedTimestamp::DateTime(dt) if dt.timezone() == chrono_tz::UTC => {
            format!("{}:{}", name, dt.format("%Y%m%dT%H%M%SZ"))
        }
        ResolvedTimestamp::DateTime(dt) => format!(
            "{};TZID={}:{}",
            name,
            dt.timezone().name(),
            dt.format("%Y%m%dT%H%M%S")
        ),
    }
}
