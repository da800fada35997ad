//! Merging occurrences from several calendars into one chronological listing.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::warn;

use crate::calendar::Calendar;
use crate::error::QuickCalError;
use crate::ics::{self, CalendarObject};
use crate::occurrence::Occurrence;
use crate::projector;
use crate::window::QueryWindow;

/// Flatten per-calendar occurrence lists and sort them by start instant.
///
/// Ties are broken by uid, then summary, then calendar name, so the result does
/// not depend on the order calendars were fetched in.
pub fn aggregate(per_calendar: Vec<Vec<Occurrence>>) -> Vec<Occurrence> {
    let mut all: Vec<Occurrence> = per_calendar.into_iter().flatten().collect();
    all.sort_by(chronological);
    all
}

fn chronological(a: &Occurrence, b: &Occurrence) -> Ordering {
    a.start
        .instant()
        .cmp(&b.start.instant())
        .then_with(|| a.uid.cmp(&b.uid))
        .then_with(|| a.summary.cmp(&b.summary))
        .then_with(|| a.calendar_name().cmp(b.calendar_name()))
}

/// A calendar object that could not be decoded or projected.
#[derive(Debug)]
pub struct ProjectionFailure {
    pub calendar: Arc<Calendar>,
    pub href: String,
    pub error: QuickCalError,
}

/// Accumulates the objects fetched from each calendar for one query window.
///
/// A bad object is recorded as a failure and the rest of the listing goes on.
#[derive(Debug)]
pub struct Listing {
    window: QueryWindow,
    groups: Vec<Vec<Occurrence>>,
    failures: Vec<ProjectionFailure>,
}

/// The merged occurrences plus every object that was skipped.
#[derive(Debug)]
pub struct ListingReport {
    pub occurrences: Vec<Occurrence>,
    pub failures: Vec<ProjectionFailure>,
}

impl ListingReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl Listing {
    pub fn new(window: QueryWindow) -> Self {
        Listing {
            window,
            groups: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Decode and project raw iCalendar data fetched from `href`.
    pub fn push_ics(&mut self, calendar: &Arc<Calendar>, href: &str, data: &str) {
        match ics::decode(data) {
            Ok(object) => self.push_object(calendar, href, &object),
            Err(error) => self.fail(calendar, href, error),
        }
    }

    pub fn push_object(&mut self, calendar: &Arc<Calendar>, href: &str, object: &CalendarObject) {
        match projector::project(object, &self.window, Some(calendar.clone())) {
            Ok(occurrences) => self.groups.push(occurrences),
            Err(error) => self.fail(calendar, href, error),
        }
    }

    fn fail(&mut self, calendar: &Arc<Calendar>, href: &str, error: QuickCalError) {
        warn!(calendar = %calendar.name, href, error = %error, "Skipping calendar object");
        self.failures.push(ProjectionFailure {
            calendar: calendar.clone(),
            href: href.to_string(),
            error,
        });
    }

    pub fn finish(self) -> ListingReport {
        ListingReport {
            occurrences: aggregate(self.groups),
            failures: self.failures,
        }
    }
}
