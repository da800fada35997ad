use anyhow::Result;
use owo_colors::OwoColorize;
use quickcal_caldav::{create_client, discover_calendars};
use quickcal_core::QuickCalConfig;
use tracing::warn;

use crate::render::Render;
use crate::utils::tui::create_spinner;

pub async fn run(config: &QuickCalConfig) -> Result<()> {
    let servers = config.usable_servers();

    if servers.is_empty() {
        anyhow::bail!(
            "No servers configured.\n\n\
            Add one to your config file:\n  \
            [[servers]]\n  \
            name = \"home\"\n  \
            url = \"https://dav.example.com/\"\n  \
            user = \"me\"\n  \
            password = \"secret\""
        );
    }

    for server in servers {
        let spinner = create_spinner(format!("Discovering calendars on {}", server.name));
        let result = match create_client(&server.url, &server.user, &server.password) {
            Ok(client) => discover_calendars(&client).await,
            Err(e) => Err(e),
        };
        spinner.finish_and_clear();

        println!("{}", server.name.bold());

        let collections = match result {
            Ok(collections) => collections,
            Err(e) => {
                warn!(server = %server.name, error = %format!("{e:#}"), "Discovery failed");
                println!("  {}", "Could not list calendars".red());
                continue;
            }
        };

        for collection in collections {
            let label = match server.calendar_by_path(&collection.href) {
                Some(tracked) => tracked.render(),
                None => collection.name.clone(),
            };
            let description = collection
                .description
                .map(|d| format!(" - {}", d))
                .unwrap_or_default();

            println!("  {}{} {}", label, description, collection.href.dimmed());
        }
    }

    Ok(())
}
