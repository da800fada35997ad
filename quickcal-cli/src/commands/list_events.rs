use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use quickcal_caldav::{create_client, query_in_range};
use quickcal_core::{Listing, QueryWindow, QuickCalConfig};
use tracing::warn;

use crate::render::Render;
use crate::utils::tui::create_spinner;

pub async fn run(config: &QuickCalConfig, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let tz = config.timezone()?;
    let window = QueryWindow::from_args(from, to, tz, Utc::now())?;

    let mut listing = Listing::new(window);

    for server in config.usable_servers() {
        let client = match create_client(&server.url, &server.user, &server.password) {
            Ok(client) => client,
            Err(e) => {
                warn!(server = %server.name, error = %format!("{e:#}"), "Skipping server");
                continue;
            }
        };

        for calendar in &server.calendars {
            let calendar = Arc::new(calendar.clone());

            let spinner = create_spinner(format!("Fetching {}", calendar.name));
            let result = query_in_range(&client, &calendar.path, &window).await;
            spinner.finish_and_clear();

            match result {
                Ok(resources) => {
                    for resource in resources {
                        listing.push_ics(&calendar, &resource.href, &resource.data);
                    }
                }
                Err(e) => {
                    warn!(
                        server = %server.name,
                        calendar = %calendar.name,
                        error = %format!("{e:#}"),
                        "Query failed, skipping calendar"
                    );
                }
            }
        }
    }

    let report = listing.finish();

    if report.occurrences.is_empty() {
        println!("{}", "No events found".dimmed());
    }

    for occurrence in &report.occurrences {
        println!("{}", occurrence.render());
    }

    if report.is_partial() {
        eprintln!(
            "{}",
            format!(
                "Skipped {} unreadable calendar object(s). Run with RUST_LOG=warn for details.",
                report.failures.len()
            )
            .yellow()
        );
    }

    Ok(())
}
