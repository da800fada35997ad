//! ICS generation for new events.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger, ValueType};

use super::{DATE_LAYOUT, DATE_TIME_LAYOUT, DTEND, DTSTART, PARAM_TZID};
use crate::error::{QuickCalError, QuickCalResult};
use crate::new_event::{EventWhen, NewEvent};

const PRODID: &str = "-//QuickCal//CalDAV Client//EN";

/// Generate the .ics content of a new event.
pub fn generate_ics(
    event: &NewEvent,
    uid: &str,
    tz: Tz,
    now: DateTime<Utc>,
) -> QuickCalResult<String> {
    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(uid);
    ics_event.summary(&event.summary);
    ics_event.add_property("DTSTAMP", now.format("%Y%m%dT%H%M%SZ").to_string());

    match event.when {
        EventWhen::AllDay(date) => {
            let mut prop = Property::new(DTSTART, date.format(DATE_LAYOUT).to_string());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
            ics_event.add_property("DURATION", "P1D");
        }
        EventWhen::Timed(local) => {
            let start = tz.from_local_datetime(&local).earliest().ok_or_else(|| {
                QuickCalError::InvalidInput(format!("{} does not exist in {}", local, tz))
            })?;
            let end = (start + Duration::hours(1)).naive_local();

            add_zoned_property(&mut ics_event, DTSTART, &local, tz);
            add_zoned_property(&mut ics_event, DTEND, &end, tz);
        }
    }

    for before in &event.alarms {
        let alarm = Alarm::display(&event.summary, Trigger::before_start(*before));
        ics_event.alarm(alarm);
    }

    cal.push(ics_event.done());
    let cal = cal.done();

    Ok(strip_ics_bloat(&cal.to_string()))
}

fn add_zoned_property(ics_event: &mut icalendar::Event, name: &str, local: &NaiveDateTime, tz: Tz) {
    let mut prop = Property::new(name, local.format(DATE_TIME_LAYOUT).to_string());
    prop.add_parameter(PARAM_TZID, tz.name());
    ics_event.append_property(prop);
}

/// Clean up output from the icalendar crate
/// - PRODID is ours
/// - CALSCALE:GREGORIAN is the default
/// - VALARMs don't need DTSTAMP or UID
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    let mut in_valarm = false;

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        match line {
            "BEGIN:VALARM" => in_valarm = true,
            "END:VALARM" => in_valarm = false,
            _ => {}
        }

        if in_valarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
