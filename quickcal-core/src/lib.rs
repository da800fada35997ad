//! Core library for quickcal, a small CalDAV calendar client.
//!
//! - `ics` decodes calendar objects and generates new events
//! - `projector` turns one calendar object into the occurrences inside a query window
//! - `aggregate` merges occurrences from every calendar into one listing
//! - `config` holds the servers and calendars being tracked

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod error;
pub mod ics;
pub mod new_event;
pub mod occurrence;
pub mod projector;
pub mod recurrence;
pub mod timestamp;
pub mod window;

pub use aggregate::{Listing, ListingReport, ProjectionFailure, aggregate};
pub use calendar::{Calendar, CalendarColor, Server};
pub use config::QuickCalConfig;
pub use error::{QuickCalError, QuickCalResult};
pub use ics::CalendarObject;
pub use new_event::{EventWhen, NewEvent};
pub use occurrence::Occurrence;
pub use projector::{project, project_with};
pub use timestamp::ResolvedTimestamp;
pub use window::QueryWindow;
