//! Interactive selection of tracked calendars, their colors and the default.

use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::{Confirm, Select};
use owo_colors::OwoColorize;
use quickcal_caldav::{CalendarCollection, create_client, discover_calendars};
use quickcal_core::{Calendar, CalendarColor, QuickCalConfig};
use tracing::warn;

use crate::utils::tui::create_spinner;

pub async fn run(mut config: QuickCalConfig, config_path: &Path) -> Result<()> {
    offer_local_timezone(&mut config)?;

    let server_names: Vec<String> = config
        .usable_servers()
        .iter()
        .map(|s| s.name.clone())
        .collect();

    if server_names.is_empty() {
        anyhow::bail!(
            "No servers configured. Add a [[servers]] entry to {}",
            config_path.display()
        );
    }

    let previous_default = config
        .default_calendar()
        .map(|(server, cal)| (server.name.clone(), cal.path.clone()));
    let mut new_default: Option<(String, String)> = None;

    for name in &server_names {
        let Some(server) = config.server_by_name(name).cloned() else {
            continue;
        };

        let spinner = create_spinner(format!("Discovering calendars on {}", server.name));
        let result = match create_client(&server.url, &server.user, &server.password) {
            Ok(client) => discover_calendars(&client).await,
            Err(e) => Err(e),
        };
        spinner.finish_and_clear();

        let collections = match result {
            Ok(collections) => collections,
            Err(e) => {
                warn!(server = %server.name, error = %format!("{e:#}"), "Discovery failed, keeping its calendars as they are");
                continue;
            }
        };

        println!("{}", server.name.bold());

        let mut tracked = Vec::new();

        for collection in &collections {
            let existing = server.calendar_by_path(&collection.href);
            let Some(mut calendar) = choose_calendar(collection, existing)? else {
                continue;
            };

            if new_default.is_none() {
                let make_default = Confirm::new()
                    .with_prompt(format!("  Use {} as the default calendar?", calendar.name))
                    .default(calendar.default)
                    .interact()?;
                if make_default {
                    new_default = Some((server.name.clone(), calendar.path.clone()));
                }
            }

            calendar.default = false;
            tracked.push(calendar);
        }

        if let Some(server) = config.server_by_name_mut(name) {
            server.calendars = tracked;
        }
    }

    // Exactly one default across all servers.
    let still_tracked = |(server, path): &(String, String)| {
        config
            .server_by_name(server)
            .is_some_and(|s| s.calendar_by_path(path).is_some())
    };
    let chosen = new_default
        .or(previous_default.filter(still_tracked))
        .or_else(|| {
            config
                .calendars()
                .next()
                .map(|(server, cal)| (server.name.clone(), cal.path.clone()))
        });

    if let Some((server, path)) = chosen {
        config.set_default(&server, &path)?;
    }

    config
        .save(config_path)
        .with_context(|| format!("Failed to save {}", config_path.display()))?;

    let count = config.calendars().count();
    println!(
        "{}",
        format!("Tracking {} {}", count, if count == 1 { "calendar" } else { "calendars" }).green()
    );

    Ok(())
}

/// Ask whether to track `collection` and in which color. `None` when declined.
fn choose_calendar(
    collection: &CalendarCollection,
    existing: Option<&Calendar>,
) -> Result<Option<Calendar>> {
    let prompt = match existing {
        Some(cal) => format!("  Keep {}?", cal.name),
        None => format!("  Add {}?", collection.name),
    };

    let keep = Confirm::new()
        .with_prompt(prompt)
        .default(existing.is_some())
        .interact()?;

    if !keep {
        return Ok(None);
    }

    let mut calendar = existing
        .cloned()
        .unwrap_or_else(|| Calendar::new(&collection.name, &collection.href));

    let color_names: Vec<&str> = CalendarColor::ALL.iter().map(|c| c.name()).collect();
    let current = calendar
        .color
        .and_then(|c| CalendarColor::ALL.iter().position(|other| *other == c))
        .unwrap_or(0);

    let selection = Select::new()
        .with_prompt("  Color")
        .items(&color_names)
        .default(current)
        .interact()?;
    calendar.color = CalendarColor::ALL.get(selection).copied();

    Ok(Some(calendar))
}

/// Offer the system timezone when the config still has a different one.
fn offer_local_timezone(config: &mut QuickCalConfig) -> Result<()> {
    let Ok(local) = iana_time_zone::get_timezone() else {
        return Ok(());
    };

    if local == config.timezone || local.parse::<chrono_tz::Tz>().is_err() {
        return Ok(());
    }

    let adopt = Confirm::new()
        .with_prompt(format!("Use {} as timezone (currently {})?", local, config.timezone))
        .default(true)
        .interact()?;

    if adopt {
        config.timezone = local;
    }

    Ok(())
}
