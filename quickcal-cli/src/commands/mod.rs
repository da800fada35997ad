pub mod calendar_config;
pub mod default_calendar;
pub mod list_calendars;
pub mod list_events;
pub mod new_event;
