//! Catalog item types shared by the feed, the store and the reports.
//!
//! - `Status`: availability of an item, parsed leniently from free text
//! - `Item`: one catalog entry as read from the feed
//! - `ItemKey`: the `section|name` composite identity

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between section and name in a composite key.
pub const KEY_SEPARATOR: char = '|';

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    On,
    Off,
    OffDisappeared,
    #[default]
    Unknown,
    Other(String),
}

impl Status {
    /// Case-insensitive, but otherwise exact: `" ON "` is not `ON`.
    pub fn parse(raw: &str) -> Self {
        let upper = raw.to_uppercase();

        match upper.as_str() {
            "" => Status::Unknown,
            "ON" => Status::On,
            "OFF" => Status::Off,
            "UNKNOWN" | "DESCONHECIDO" => Status::Unknown,
            // legacy files wrote the portuguese sentinel
            s if s.contains("DISAPPEAR") || s.contains("DESAPARECEU") => Status::OffDisappeared,
            _ => Status::Other(raw.to_string()),
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Status::On)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::On => "ON",
            Status::Off => "OFF",
            Status::OffDisappeared => "OFF (Disappeared)",
            Status::Unknown => "UNKNOWN",
            Status::Other(s) => s,
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Status::parse(&s)
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub section: String,
    pub name: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
}

impl Item {
    pub fn key(&self) -> ItemKey {
        ItemKey::compose(&self.section, &self.name)
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Composite `section|name` identity of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn compose(section: &str, name: &str) -> Self {
        ItemKey(format!("{section}{KEY_SEPARATOR}{name}"))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        ItemKey(raw.into())
    }

    /// Splits on the first separator only, names may contain `|`.
    pub fn split(&self) -> (&str, &str) {
        self.0.split_once(KEY_SEPARATOR).unwrap_or((self.0.as_str(), ""))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
