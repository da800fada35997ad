//! quickcal configuration, stored at ~/.config/quickcal/config.toml

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calendar::{Calendar, Server};
use crate::error::{QuickCalError, QuickCalResult};

const DEFAULT_TIMEZONE: &str = "UTC";

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickCalConfig {
    /// IANA zone for dates typed on the command line and for new events.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub servers: Vec<Server>,
}

impl Default for QuickCalConfig {
    fn default() -> Self {
        QuickCalConfig {
            timezone: default_timezone(),
            servers: Vec::new(),
        }
    }
}

impl QuickCalConfig {
    /// ~/.config/quickcal/config.toml (platform equivalent elsewhere)
    pub fn default_path() -> QuickCalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| QuickCalError::Config("Could not determine config directory".into()))?
            .join("quickcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Resolve a `--config` argument, expanding `~`. Falls back to [`Self::default_path`].
    pub fn resolve_path(path: Option<&str>) -> QuickCalResult<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(shellexpand::tilde(p).into_owned())),
            None => Self::default_path(),
        }
    }

    /// Load the config at `path`, writing a commented template first if it is missing.
    /// `QUICKCAL_*` environment variables override file values.
    pub fn load(path: &Path) -> QuickCalResult<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        debug!(path = %path.display(), "Loading config");

        Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("QUICKCAL").separator("__"))
            .build()
            .map_err(|e| QuickCalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| QuickCalError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> QuickCalResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| QuickCalError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuickCalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| QuickCalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a config file with all options commented out.
    pub fn create_default_config(path: &Path) -> QuickCalResult<()> {
        let contents = "\
# quickcal configuration

# Timezone for dates given on the command line and for new events:
# timezone = \"Europe/Berlin\"

# CalDAV servers. Run `quickcal calendar config` to pick calendars.
# [[servers]]
# name = \"home\"
# url = \"https://dav.example.com/\"
# user = \"me\"
# password = \"secret\"
";

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuickCalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| QuickCalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn timezone(&self) -> QuickCalResult<Tz> {
        self.timezone
            .parse()
            .map_err(|_| QuickCalError::Config(format!("Unknown timezone '{}'", self.timezone)))
    }

    /// Servers with url, user and password set. Others are skipped with a warning.
    pub fn usable_servers(&self) -> Vec<&Server> {
        self.servers
            .iter()
            .filter(|server| {
                if !server.is_complete() {
                    warn!(server = %server.name, "Server is missing url, user or password, skipping");
                }
                server.is_complete()
            })
            .collect()
    }

    pub fn server_by_name(&self, name: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn server_by_name_mut(&mut self, name: &str) -> Option<&mut Server> {
        self.servers.iter_mut().find(|s| s.name == name)
    }

    /// Every tracked calendar with the server it lives on.
    pub fn calendars(&self) -> impl Iterator<Item = (&Server, &Calendar)> {
        self.servers
            .iter()
            .flat_map(|server| server.calendars.iter().map(move |cal| (server, cal)))
    }

    pub fn default_calendar(&self) -> Option<(&Server, &Calendar)> {
        self.calendars().find(|(_, cal)| cal.default)
    }

    /// Look up a calendar by name (case-insensitive) or by path.
    pub fn find_calendar(&self, name_or_path: &str) -> Option<(&Server, &Calendar)> {
        self.calendars()
            .find(|(_, cal)| cal.name.eq_ignore_ascii_case(name_or_path))
            .or_else(|| self.calendars().find(|(_, cal)| cal.path == name_or_path))
    }

    /// Make the calendar at `path` on `server` the only default.
    pub fn set_default(&mut self, server: &str, path: &str) -> QuickCalResult<()> {
        let exists = self
            .server_by_name(server)
            .is_some_and(|s| s.calendar_by_path(path).is_some());
        if !exists {
            return Err(QuickCalError::Config(format!(
                "No calendar '{}' on server '{}'",
                path, server
            )));
        }

        for srv in &mut self.servers {
            for cal in &mut srv.calendars {
                cal.default = srv.name == server && cal.path == path;
            }
        }

        Ok(())
    }
}
