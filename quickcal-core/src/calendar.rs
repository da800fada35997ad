//! Tracked calendars and the servers hosting them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuickCalError;

/// Display color of a calendar. Resolved to terminal styling only when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl CalendarColor {
    pub const ALL: [CalendarColor; 8] = [
        CalendarColor::Black,
        CalendarColor::Red,
        CalendarColor::Green,
        CalendarColor::Yellow,
        CalendarColor::Blue,
        CalendarColor::Magenta,
        CalendarColor::Cyan,
        CalendarColor::White,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CalendarColor::Black => "black",
            CalendarColor::Red => "red",
            CalendarColor::Green => "green",
            CalendarColor::Yellow => "yellow",
            CalendarColor::Blue => "blue",
            CalendarColor::Magenta => "magenta",
            CalendarColor::Cyan => "cyan",
            CalendarColor::White => "white",
        }
    }
}

impl fmt::Display for CalendarColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CalendarColor {
    type Err = QuickCalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CalendarColor::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QuickCalError::Config(format!("Unknown calendar color '{}'", s)))
    }
}

/// A calendar collection tracked in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub name: String,
    /// Collection href on the server, e.g. `/dav/calendars/me/personal/`
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<CalendarColor>,
    #[serde(default)]
    pub default: bool,
}

impl Calendar {
    pub fn new(name: &str, path: &str) -> Self {
        Calendar {
            name: name.to_string(),
            path: path.to_string(),
            color: None,
            default: false,
        }
    }

    /// Href of a new resource named after `uid` inside this collection.
    pub fn resource_href(&self, uid: &str) -> String {
        format!("{}/{}.ics", self.path.trim_end_matches('/'), uid)
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A CalDAV server with its tracked calendars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub calendars: Vec<Calendar>,
}

impl Server {
    /// Whether url, user and password are all present.
    pub fn is_complete(&self) -> bool {
        !self.url.is_empty() && !self.user.is_empty() && !self.password.is_empty()
    }

    pub fn calendar_by_path(&self, path: &str) -> Option<&Calendar> {
        self.calendars.iter().find(|c| c.path == path)
    }
}
