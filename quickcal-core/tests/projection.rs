use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use quickcal_core::ics::decode;
use quickcal_core::{Calendar, Listing, QueryWindow, QuickCalError, ResolvedTimestamp, aggregate, project};

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

fn june() -> QueryWindow {
    QueryWindow::new(utc(2025, 6, 1, 0, 0, 0), utc(2025, 6, 30, 0, 0, 0))
}

fn wrap(events: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//EN\r\n{}END:VCALENDAR\r\n",
        events
    )
}

const ALL_DAY: &str = "BEGIN:VEVENT\r\n\
UID:holiday-1\r\n\
SUMMARY:Holiday\r\n\
DTSTART;VALUE=DATE:20250610\r\n\
END:VEVENT\r\n";

const STANDUP: &str = "BEGIN:VEVENT\r\n\
UID:standup-1\r\n\
SUMMARY:Standup\r\n\
DTSTART;TZID=UTC:20250601T090000\r\n\
DTEND;TZID=UTC:20250601T100000\r\n\
RRULE:FREQ=DAILY;COUNT=5\r\n\
END:VEVENT\r\n";

#[test]
fn test_all_day_event_resolves_to_midnight_utc() {
    let object = decode(&wrap(ALL_DAY)).unwrap();

    let occurrences = project(&object, &june(), None).unwrap();

    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].uid, "holiday-1");
    assert_eq!(occurrences[0].summary, "Holiday");
    assert_eq!(
        occurrences[0].start,
        ResolvedTimestamp::Date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap())
    );
    assert_eq!(occurrences[0].start.instant(), utc(2025, 6, 10, 0, 0, 0));
}

#[test]
fn test_daily_recurrence_inside_two_day_window() {
    let object = decode(&wrap(STANDUP)).unwrap();
    let window = QueryWindow::new(utc(2025, 6, 3, 0, 0, 0), utc(2025, 6, 4, 23, 59, 59));

    let occurrences = project(&object, &window, None).unwrap();

    let starts: Vec<DateTime<Utc>> = occurrences.iter().map(|o| o.start.instant()).collect();
    assert_eq!(starts, vec![utc(2025, 6, 3, 9, 0, 0), utc(2025, 6, 4, 9, 0, 0)]);
    assert!(occurrences.iter().all(|o| o.uid == "standup-1"));
    assert!(occurrences.iter().all(|o| o.duration() == Some(Duration::hours(1))));
}

#[test]
fn test_unknown_timezone_fails_projection() {
    let ics = wrap(
        "BEGIN:VEVENT\r\n\
UID:bad-1\r\n\
DTSTART;TZID=Nowhere/Special:20250601T090000\r\n\
END:VEVENT\r\n",
    );
    let object = decode(&ics).unwrap();

    let err = project(&object, &june(), None).unwrap_err();
    assert!(matches!(err, QuickCalError::UnparseableTimestamp { .. }), "{err:?}");
}

#[test]
fn test_exdate_and_override_shape_the_series() {
    let ics = wrap(
        "BEGIN:VEVENT\r\n\
UID:series-1\r\n\
SUMMARY:Gym\r\n\
DTSTART;TZID=Europe/Berlin:20250602T180000\r\n\
DTEND;TZID=Europe/Berlin:20250602T190000\r\n\
RRULE:FREQ=DAILY;COUNT=4\r\n\
EXDATE;TZID=Europe/Berlin:20250603T180000\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:series-1\r\n\
SUMMARY:Gym (late)\r\n\
RECURRENCE-ID;TZID=Europe/Berlin:20250604T180000\r\n\
DTSTART;TZID=Europe/Berlin:20250604T200000\r\n\
DTEND;TZID=Europe/Berlin:20250604T210000\r\n\
END:VEVENT\r\n",
    );
    let object = decode(&ics).unwrap();

    let occurrences = aggregate(vec![project(&object, &june(), None).unwrap()]);

    let got: Vec<(DateTime<Utc>, &str)> = occurrences
        .iter()
        .map(|o| (o.start.instant(), o.summary.as_str()))
        .collect();
    assert_eq!(
        got,
        vec![
            (utc(2025, 6, 2, 16, 0, 0), "Gym"),
            (utc(2025, 6, 4, 18, 0, 0), "Gym (late)"),
            (utc(2025, 6, 5, 16, 0, 0), "Gym"),
        ]
    );
}

#[test]
fn test_listing_merges_calendars_and_reports_failures() {
    let personal = Arc::new(Calendar::new("Personal", "/cal/personal/"));
    let work = Arc::new(Calendar::new("Work", "/cal/work/"));
    let broken = wrap(
        "BEGIN:VEVENT\r\n\
UID:broken-1\r\n\
DTSTART:20250601T090000Z\r\n\
END:VEVENT\r\n",
    );

    let mut listing = Listing::new(june());
    listing.push_ics(&work, "/cal/work/standup.ics", &wrap(STANDUP));
    listing.push_ics(&work, "/cal/work/broken.ics", &broken);
    listing.push_ics(&personal, "/cal/personal/holiday.ics", &wrap(ALL_DAY));
    let report = listing.finish();

    assert_eq!(report.occurrences.len(), 6);
    let names: Vec<&str> = report.occurrences.iter().map(|o| o.calendar_name()).collect();
    assert_eq!(names, vec!["Work", "Work", "Work", "Work", "Work", "Personal"]);
    for pair in report.occurrences.windows(2) {
        assert!(pair[0].start.instant() <= pair[1].start.instant());
    }

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].calendar.name, "Work");
    assert!(matches!(
        report.failures[0].error,
        QuickCalError::UnrecognizedTimestamp { .. }
    ));
}

#[test]
fn test_all_day_series_with_date_until() {
    let ics = wrap(
        "BEGIN:VEVENT\r\n\
UID:bins-1\r\n\
SUMMARY:Bins out\r\n\
DTSTART;VALUE=DATE:20250602\r\n\
DTEND;VALUE=DATE:20250603\r\n\
RRULE:FREQ=WEEKLY;UNTIL=20250616\r\n\
END:VEVENT\r\n",
    );
    let object = decode(&ics).unwrap();

    let occurrences = project(&object, &june(), None).unwrap();

    let days: Vec<ResolvedTimestamp> = occurrences.iter().map(|o| o.start.clone()).collect();
    let day = |d| ResolvedTimestamp::Date(NaiveDate::from_ymd_opt(2025, 6, d).unwrap());
    assert_eq!(days, vec![day(2), day(9), day(16)]);
}

#[test]
fn test_all_day_event_listed_on_its_day_west_of_utc() {
    let window = QueryWindow::from_args(
        Some("10/06/2025"),
        Some("10/06/2025"),
        chrono_tz::America::New_York,
        utc(2025, 6, 1, 12, 0, 0),
    )
    .unwrap();
    let eleventh = ALL_DAY.replace("holiday-1", "holiday-2").replace("20250610", "20250611");
    let object = decode(&wrap(&format!("{}{}", ALL_DAY, eleventh))).unwrap();

    let occurrences = project(&object, &window, None).unwrap();

    let uids: Vec<&str> = occurrences.iter().map(|o| o.uid.as_str()).collect();
    assert_eq!(uids, vec!["holiday-1"]);
}
