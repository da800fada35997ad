mod commands;
mod render;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quickcal_core::QuickCalConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quickcal")]
#[command(about = "List upcoming events from your CalDAV calendars and add new ones")]
struct Cli {
    /// Config file (default: ~/.config/quickcal/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List or create events
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },
    /// Manage tracked calendars
    Calendar {
        #[command(subcommand)]
        command: CalendarCommands,
    },
}

#[derive(Subcommand)]
enum EventCommands {
    /// Show events from all tracked calendars, oldest first
    List {
        /// First day to show (dd/mm or dd/mm/yyyy, default: now)
        #[arg(long)]
        from: Option<String>,

        /// Last day to show (dd/mm or dd/mm/yyyy, default: a week after --from)
        #[arg(long)]
        to: Option<String>,
    },
    /// Create an event (all-day unless TIME is given)
    New {
        summary: String,

        /// dd/mm or dd/mm/yyyy
        date: String,

        /// hh:mm
        time: Option<String>,

        /// Reminder before the start, e.g. 15m or 1h (repeatable)
        #[arg(short, long = "alarm")]
        alarms: Vec<String>,

        /// Calendar name or path (default: the default calendar)
        #[arg(short, long)]
        calendar: Option<String>,
    },
}

#[derive(Subcommand)]
enum CalendarCommands {
    /// List the calendars available on each server
    List,
    /// Show the default calendar
    Default,
    /// Choose which calendars to track, their colors and the default
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config_path = QuickCalConfig::resolve_path(cli.config.as_deref())?;
    let config = QuickCalConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    match cli.command {
        Commands::Event { command } => match command {
            EventCommands::List { from, to } => {
                commands::list_events::run(&config, from.as_deref(), to.as_deref()).await
            }
            EventCommands::New {
                summary,
                date,
                time,
                alarms,
                calendar,
            } => {
                commands::new_event::run(
                    &config,
                    &summary,
                    &date,
                    time.as_deref(),
                    &alarms,
                    calendar.as_deref(),
                )
                .await
            }
        },
        Commands::Calendar { command } => match command {
            CalendarCommands::List => commands::list_calendars::run(&config).await,
            CalendarCommands::Default => commands::default_calendar::run(&config),
            CalendarCommands::Config => commands::calendar_config::run(config, &config_path).await,
        },
    }
}

/// Log to stderr, filtered by RUST_LOG (default: warnings only).
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
