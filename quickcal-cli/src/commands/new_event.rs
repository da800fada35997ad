use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Utc};
use owo_colors::OwoColorize;
use quickcal_caldav::{create_client, put_object};
use quickcal_core::new_event::new_uid;
use quickcal_core::window::{parse_input_date, parse_input_date_time};
use quickcal_core::{Calendar, EventWhen, NewEvent, QuickCalConfig, Server};

use crate::utils::tui::create_spinner;

pub async fn run(
    config: &QuickCalConfig,
    summary: &str,
    date: &str,
    time: Option<&str>,
    alarms: &[String],
    calendar: Option<&str>,
) -> Result<()> {
    let tz = config.timezone()?;
    let now = Utc::now();
    let year = now.with_timezone(&tz).year();

    let when = match time {
        Some(time) => EventWhen::Timed(parse_input_date_time(date, time, year)?),
        None => EventWhen::AllDay(parse_input_date(date, year)?),
    };

    let event = NewEvent {
        summary: summary.to_string(),
        when,
        alarms: alarms
            .iter()
            .map(|a| parse_alarm(a))
            .collect::<Result<Vec<_>>>()?,
    };

    let (server, calendar) = resolve_calendar(config, calendar)?;
    if !server.is_complete() {
        anyhow::bail!("Server '{}' is missing url, user or password", server.name);
    }

    let uid = new_uid();
    let ics = event.to_ics(&uid, tz, now)?;
    let href = calendar.resource_href(&uid);

    let client = create_client(&server.url, &server.user, &server.password)?;

    let spinner = create_spinner(format!("Creating event in {}", calendar.name));
    let result = put_object(&client, &href, &ics).await;
    spinner.finish_and_clear();
    result?;

    println!("{}", format!("Created: {} ({})", event.summary, calendar.name).green());

    Ok(())
}

/// Parse a reminder offset such as `15m` or `1h 30m`.
fn parse_alarm(input: &str) -> Result<Duration> {
    let std_dur = humantime::parse_duration(input)
        .with_context(|| format!("Could not parse alarm: \"{}\"", input))?;
    Duration::from_std(std_dur).context("Alarm offset too large")
}

/// `--calendar` by name or path, otherwise the default calendar.
fn resolve_calendar<'a>(
    config: &'a QuickCalConfig,
    name_or_path: Option<&str>,
) -> Result<(&'a Server, &'a Calendar)> {
    if let Some(wanted) = name_or_path {
        return config.find_calendar(wanted).ok_or_else(|| {
            let available: Vec<_> = config.calendars().map(|(_, c)| c.name.as_str()).collect();
            anyhow::anyhow!(
                "Calendar '{}' not found. Available: {}",
                wanted,
                available.join(", ")
            )
        });
    }

    config.default_calendar().ok_or_else(|| {
        anyhow::anyhow!(
            "No default calendar found.\n\n\
            Pick one with:\n  \
            quickcal calendar config\n\n\
            or pass --calendar <name>"
        )
    })
}
