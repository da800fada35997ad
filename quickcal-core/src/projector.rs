//! Projection of calendar objects onto a query window.
//!
//! A calendar object (one VCALENDAR resource) is turned into the occurrences of
//! its VEVENT children that start inside the window:
//! - events without RRULE yield at most one occurrence
//! - recurring events are expanded, each instance keeping the original duration
//! - instances replaced by a RECURRENCE-ID override are left to the override

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::calendar::Calendar;
use crate::error::{QuickCalError, QuickCalResult};
use crate::ics::{
    CalendarObject, Component, DTEND, DTSTART, EXDATE, RECURRENCE_ID, RRULE, SUMMARY, UID,
    VCALENDAR, VEVENT,
};
use crate::occurrence::Occurrence;
use crate::recurrence::{Expansion, RRuleEvaluator, RecurrenceEvaluator};
use crate::timestamp::{self, ResolvedTimestamp};
use crate::window::QueryWindow;

/// Project `object` onto `window` using the rrule-backed evaluator.
pub fn project(
    object: &CalendarObject,
    window: &QueryWindow,
    calendar: Option<Arc<Calendar>>,
) -> QuickCalResult<Vec<Occurrence>> {
    project_with(object, window, calendar, &RRuleEvaluator)
}

/// Project `object` onto `window` with a custom recurrence evaluator.
///
/// Every VEVENT child is processed; other children are skipped. The first
/// timestamp or recurrence error aborts the whole object.
pub fn project_with(
    object: &CalendarObject,
    window: &QueryWindow,
    calendar: Option<Arc<Calendar>>,
    evaluator: &dyn RecurrenceEvaluator,
) -> QuickCalResult<Vec<Occurrence>> {
    if !object.is(VCALENDAR) {
        return Err(QuickCalError::MalformedInput(format!(
            "expected {} component, found '{}'",
            VCALENDAR, object.name
        )));
    }

    let events: Vec<&Component> = object.components.iter().filter(|c| c.is(VEVENT)).collect();
    let overridden = overridden_instances(&events)?;

    let mut occurrences = Vec::new();

    for component in events {
        let Some(event) = EventData::resolve(component)? else {
            continue;
        };

        match event.rule {
            None => {
                if window.contains_timestamp(&event.start) {
                    occurrences.push(event.occurrence(event.start.clone(), event.end.clone(), &calendar));
                }
            }
            Some(rule) => {
                let expansion = Expansion {
                    uid: event.uid,
                    rule,
                    anchor: &event.start,
                    exdates: &event.exdates,
                };
                let duration = event
                    .end
                    .as_ref()
                    .map(|end| end.instant() - event.start.instant());

                let bounds = window.expansion_bounds(&event.start);

                for instant in evaluator.between(&expansion, &bounds)? {
                    let start = event.start.like(instant);
                    // The evaluator may be off by one at the edges.
                    if !window.contains_timestamp(&start) {
                        continue;
                    }
                    if overridden.contains(&(event.uid, instant)) {
                        continue;
                    }

                    let end = event
                        .end
                        .as_ref()
                        .zip(duration)
                        .map(|(end, duration)| end.like(instant + duration));
                    occurrences.push(event.occurrence(start, end, &calendar));
                }
            }
        }
    }

    debug!(
        calendar = calendar.as_deref().map(|c| c.name.as_str()).unwrap_or_default(),
        count = occurrences.len(),
        "Projected calendar object"
    );

    Ok(occurrences)
}

/// The fields of one VEVENT the projection needs, with timestamps resolved.
struct EventData<'a> {
    uid: &'a str,
    summary: &'a str,
    start: ResolvedTimestamp,
    end: Option<ResolvedTimestamp>,
    rule: Option<&'a str>,
    exdates: Vec<ResolvedTimestamp>,
}

impl<'a> EventData<'a> {
    /// `Ok(None)` when the event has no DTSTART and cannot be scheduled.
    fn resolve(component: &'a Component) -> QuickCalResult<Option<Self>> {
        let Some(start_prop) = component.find_prop(DTSTART) else {
            return Ok(None);
        };
        let start = timestamp::resolve(start_prop)?;

        let end = component.find_prop(DTEND).map(timestamp::resolve).transpose()?;

        let rule = component
            .find_prop(RRULE)
            .map(|p| p.value.as_str())
            .filter(|r| !r.trim().is_empty());

        let mut exdates = Vec::new();
        if rule.is_some() {
            for prop in component.props(EXDATE) {
                exdates.extend(timestamp::resolve_list(prop)?);
            }
        }

        Ok(Some(EventData {
            uid: component.text(UID),
            summary: component.text(SUMMARY),
            start,
            end,
            rule,
            exdates,
        }))
    }

    fn occurrence(
        &self,
        start: ResolvedTimestamp,
        end: Option<ResolvedTimestamp>,
        calendar: &Option<Arc<Calendar>>,
    ) -> Occurrence {
        Occurrence {
            uid: self.uid.to_string(),
            summary: self.summary.to_string(),
            start,
            end,
            calendar: calendar.clone(),
        }
    }
}

/// (uid, original instant) pairs replaced by RECURRENCE-ID overrides.
fn overridden_instances<'a>(
    events: &[&'a Component],
) -> QuickCalResult<HashSet<(&'a str, DateTime<Utc>)>> {
    let mut overridden = HashSet::new();

    for event in events.iter().copied() {
        if let Some(recurrence_id) = event.find_prop(RECURRENCE_ID) {
            let instant = timestamp::resolve(recurrence_id)?.instant();
            overridden.insert((event.text(UID), instant));
        }
    }

    Ok(overridden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::{PARAM_TZID, PARAM_VALUE, Property};
    use chrono::{Duration, NaiveDate, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn june() -> QueryWindow {
        QueryWindow::new(utc(2025, 6, 1, 0, 0, 0), utc(2025, 6, 30, 0, 0, 0))
    }

    fn zoned(name: &str, tzid: &str, value: &str) -> Property {
        Property::new(name, value).with_param(PARAM_TZID, tzid)
    }

    fn event(uid: &str, summary: &str) -> Component {
        Component::new(VEVENT)
            .with_property(Property::new(UID, uid))
            .with_property(Property::new(SUMMARY, summary))
    }

    fn calendar_of(events: Vec<Component>) -> CalendarObject {
        events
            .into_iter()
            .fold(Component::new(VCALENDAR), Component::with_component)
    }

    /// Returns fixed instants regardless of the rule.
    struct FixedEvaluator(Vec<DateTime<Utc>>);

    impl RecurrenceEvaluator for FixedEvaluator {
        fn between(&self, _: &Expansion<'_>, _: &QueryWindow) -> QuickCalResult<Vec<DateTime<Utc>>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_single_all_day_event() {
        let object = calendar_of(vec![event("a", "Holiday").with_property(
            Property::new(DTSTART, "20250610").with_param(PARAM_VALUE, "DATE"),
        )]);

        let occurrences = project(&object, &june(), None).unwrap();

        assert_eq!(occurrences.len(), 1);
        let occ = &occurrences[0];
        assert_eq!(occ.uid, "a");
        assert_eq!(occ.summary, "Holiday");
        assert_eq!(occ.start, ResolvedTimestamp::Date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()));
        assert_eq!(occ.start.instant(), utc(2025, 6, 10, 0, 0, 0));
        assert_eq!(occ.end, None);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let window = QueryWindow::new(utc(2025, 6, 1, 9, 0, 0), utc(2025, 6, 2, 9, 0, 0));
        let object = calendar_of(vec![
            event("at-from", "").with_property(zoned(DTSTART, "UTC", "20250601T090000")),
            event("at-to", "").with_property(zoned(DTSTART, "UTC", "20250602T090000")),
            event("before", "").with_property(zoned(DTSTART, "UTC", "20250601T085959")),
            event("after", "").with_property(zoned(DTSTART, "UTC", "20250602T090001")),
        ]);

        let occurrences = project(&object, &window, None).unwrap();
        let uids: Vec<&str> = occurrences.iter().map(|o| o.uid.as_str()).collect();

        assert_eq!(uids, vec!["at-from", "at-to"]);
    }

    #[test]
    fn test_daily_recurrence_keeps_duration() {
        let object = calendar_of(vec![
            event("daily", "Standup")
                .with_property(zoned(DTSTART, "UTC", "20250601T090000"))
                .with_property(zoned(DTEND, "UTC", "20250601T100000"))
                .with_property(Property::new(RRULE, "FREQ=DAILY;COUNT=5")),
        ]);
        let window = QueryWindow::new(utc(2025, 6, 3, 0, 0, 0), utc(2025, 6, 4, 23, 59, 59));

        let occurrences = project(&object, &window, None).unwrap();

        let starts: Vec<DateTime<Utc>> = occurrences.iter().map(|o| o.start.instant()).collect();
        assert_eq!(starts, vec![utc(2025, 6, 3, 9, 0, 0), utc(2025, 6, 4, 9, 0, 0)]);
        for occ in &occurrences {
            assert_eq!(occ.uid, "daily");
            assert_eq!(occ.summary, "Standup");
            assert_eq!(occ.duration(), Some(Duration::hours(1)));
        }
    }

    #[test]
    fn test_recurrence_without_end_has_no_end() {
        let object = calendar_of(vec![
            event("weekly", "Review")
                .with_property(zoned(DTSTART, "Europe/Berlin", "20250602T140000"))
                .with_property(Property::new(RRULE, "FREQ=WEEKLY")),
        ]);

        let occurrences = project(&object, &june(), None).unwrap();

        // Mondays 2, 9, 16, 23 June
        assert_eq!(occurrences.len(), 4);
        assert!(occurrences.iter().all(|o| o.end.is_none()));
    }

    #[test]
    fn test_all_day_recurrence_stays_all_day() {
        let object = calendar_of(vec![
            event("bins", "Bins out")
                .with_property(Property::new(DTSTART, "20250602").with_param(PARAM_VALUE, "DATE"))
                .with_property(Property::new(DTEND, "20250603").with_param(PARAM_VALUE, "DATE"))
                .with_property(Property::new(RRULE, "FREQ=WEEKLY;COUNT=2")),
        ]);

        let occurrences = project(&object, &june(), None).unwrap();

        assert_eq!(occurrences.len(), 2);
        assert_eq!(
            occurrences[1].start,
            ResolvedTimestamp::Date(NaiveDate::from_ymd_opt(2025, 6, 9).unwrap())
        );
        assert_eq!(
            occurrences[1].end,
            Some(ResolvedTimestamp::Date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()))
        );
    }

    #[test]
    fn test_all_day_events_match_the_days_of_a_zoned_window() {
        // 10 June in New York: 04:00Z to 03:59:59Z the next day
        let window = QueryWindow::new(utc(2025, 6, 10, 4, 0, 0), utc(2025, 6, 11, 3, 59, 59))
            .in_zone(chrono_tz::America::New_York);
        let object = calendar_of(vec![
            event("tenth", "")
                .with_property(Property::new(DTSTART, "20250610").with_param(PARAM_VALUE, "DATE")),
            event("eleventh", "")
                .with_property(Property::new(DTSTART, "20250611").with_param(PARAM_VALUE, "DATE")),
            event("daily", "")
                .with_property(Property::new(DTSTART, "20250601").with_param(PARAM_VALUE, "DATE"))
                .with_property(Property::new(RRULE, "FREQ=DAILY")),
        ]);

        let occurrences = project(&object, &window, None).unwrap();

        let got: Vec<(&str, ResolvedTimestamp)> = occurrences
            .iter()
            .map(|o| (o.uid.as_str(), o.start.clone()))
            .collect();
        let tenth = ResolvedTimestamp::Date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
        assert_eq!(got, vec![("tenth", tenth.clone()), ("daily", tenth)]);
    }

    #[test]
    fn test_out_of_window_evaluator_results_are_discarded() {
        let window = QueryWindow::new(utc(2025, 6, 3, 0, 0, 0), utc(2025, 6, 4, 0, 0, 0));
        let evaluator = FixedEvaluator(vec![
            utc(2025, 6, 2, 23, 59, 59),
            utc(2025, 6, 3, 0, 0, 0),
            utc(2025, 6, 3, 12, 0, 0),
            utc(2025, 6, 4, 0, 0, 0),
            utc(2025, 6, 4, 0, 0, 1),
        ]);
        let object = calendar_of(vec![
            event("r", "")
                .with_property(zoned(DTSTART, "UTC", "20250601T000000"))
                .with_property(Property::new(RRULE, "FREQ=HOURLY")),
        ]);

        let occurrences = project_with(&object, &window, None, &evaluator).unwrap();

        assert_eq!(occurrences.len(), 3);
        assert!(occurrences.iter().all(|o| window.contains(o.start.instant())));
    }

    #[test]
    fn test_every_event_child_is_processed() {
        let object = calendar_of(vec![
            event("recurring", "")
                .with_property(zoned(DTSTART, "UTC", "20250601T090000"))
                .with_property(Property::new(RRULE, "FREQ=DAILY;COUNT=2")),
            event("single", "").with_property(zoned(DTSTART, "UTC", "20250610T090000")),
        ]);

        let occurrences = project(&object, &june(), None).unwrap();
        let uids: Vec<&str> = occurrences.iter().map(|o| o.uid.as_str()).collect();

        assert_eq!(uids, vec!["recurring", "recurring", "single"]);
    }

    #[test]
    fn test_non_event_children_and_missing_start_are_skipped() {
        let object = calendar_of(vec![
            Component::new("VTIMEZONE").with_property(Property::new("TZID", "Europe/Berlin")),
            Component::new("VTODO").with_property(zoned(DTSTART, "UTC", "20250610T090000")),
            event("no-start", "Someday"),
        ]);

        let occurrences = project(&object, &june(), None).unwrap();
        assert!(occurrences.is_empty());
    }

    #[test]
    fn test_missing_uid_and_summary_are_empty() {
        let object = calendar_of(vec![
            Component::new(VEVENT).with_property(zoned(DTSTART, "UTC", "20250610T090000")),
        ]);

        let occurrences = project(&object, &june(), None).unwrap();
        assert_eq!(occurrences[0].uid, "");
        assert_eq!(occurrences[0].summary, "");
    }

    #[test]
    fn test_not_a_calendar_is_malformed() {
        let object = event("a", "").with_property(zoned(DTSTART, "UTC", "20250610T090000"));

        let err = project(&object, &june(), None).unwrap_err();
        assert!(matches!(err, QuickCalError::MalformedInput(_)), "{err:?}");
    }

    #[test]
    fn test_bad_timezone_fails_the_object() {
        let object = calendar_of(vec![
            event("ok", "").with_property(zoned(DTSTART, "UTC", "20250610T090000")),
            event("bad", "").with_property(zoned(DTSTART, "Nowhere/Special", "20250611T090000")),
        ]);

        let err = project(&object, &june(), None).unwrap_err();
        assert!(matches!(err, QuickCalError::UnparseableTimestamp { .. }), "{err:?}");
    }

    #[test]
    fn test_unrecognized_end_is_not_treated_as_absent() {
        let object = calendar_of(vec![
            event("a", "")
                .with_property(zoned(DTSTART, "UTC", "20250610T090000"))
                .with_property(Property::new(DTEND, "20250610T100000Z")),
        ]);

        let err = project(&object, &june(), None).unwrap_err();
        assert!(matches!(err, QuickCalError::UnrecognizedTimestamp { .. }), "{err:?}");
    }

    #[test]
    fn test_recurrence_id_override_replaces_instance() {
        let object = calendar_of(vec![
            event("daily", "Standup")
                .with_property(zoned(DTSTART, "UTC", "20250601T090000"))
                .with_property(zoned(DTEND, "UTC", "20250601T093000"))
                .with_property(Property::new(RRULE, "FREQ=DAILY;COUNT=3")),
            event("daily", "Standup (moved)")
                .with_property(zoned(RECURRENCE_ID, "UTC", "20250602T090000"))
                .with_property(zoned(DTSTART, "UTC", "20250602T110000"))
                .with_property(zoned(DTEND, "UTC", "20250602T113000")),
        ]);

        let occurrences = project(&object, &june(), None).unwrap();

        let mut starts: Vec<(DateTime<Utc>, &str)> = occurrences
            .iter()
            .map(|o| (o.start.instant(), o.summary.as_str()))
            .collect();
        starts.sort();
        assert_eq!(
            starts,
            vec![
                (utc(2025, 6, 1, 9, 0, 0), "Standup"),
                (utc(2025, 6, 2, 11, 0, 0), "Standup (moved)"),
                (utc(2025, 6, 3, 9, 0, 0), "Standup"),
            ]
        );
    }

    #[test]
    fn test_calendar_back_reference_is_shared() {
        let calendar = Arc::new(Calendar::new("Personal", "/cal/personal/"));
        let object = calendar_of(vec![
            event("daily", "")
                .with_property(zoned(DTSTART, "UTC", "20250601T090000"))
                .with_property(Property::new(RRULE, "FREQ=DAILY;COUNT=3")),
        ]);

        let occurrences = project(&object, &june(), Some(calendar.clone())).unwrap();

        assert_eq!(occurrences.len(), 3);
        assert!(occurrences
            .iter()
            .all(|o| o.calendar.as_ref().is_some_and(|c| Arc::ptr_eq(c, &calendar))));
    }
}
