use anyhow::Result;
use owo_colors::OwoColorize;
use quickcal_core::QuickCalConfig;

use crate::render::Render;

pub fn run(config: &QuickCalConfig) -> Result<()> {
    match config.default_calendar() {
        Some((server, calendar)) => {
            println!("{} {}", calendar.render(), format!("[{}]", server.name).dimmed());
        }
        None => println!("No default calendar found"),
    }

    Ok(())
}
