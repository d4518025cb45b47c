//! Append-only status history.
//!
//! The file is always written as a JSON list of entries. Older releases
//! wrote a `{"records": [...]}` wrapper or an object keyed by arbitrary ids;
//! both are accepted on read and normalized to the list form here, before
//! any aggregation sees the data.
//!
//! Entries read from disk are written back exactly as they were read, key
//! names and order included. Only entries recorded by this run use the
//! current field names.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::PersistenceError;
use crate::model::{Item, Status};
use crate::store::diff::DisappearedItem;
use crate::util::lenient_string;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordKind {
    Current,
    Disappeared,
    #[default]
    Unknown,
    Other(String),
}

impl RecordKind {
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "" => RecordKind::Unknown,
            "CURRENT" | "ATUAL" => RecordKind::Current,
            s if s.contains("DISAPPEAR") || s.contains("DESAPARECIDO") || s.contains("DESAPARECEU") => {
                RecordKind::Disappeared
            }
            _ => RecordKind::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecordKind::Current => "CURRENT",
            RecordKind::Disappeared => "DISAPPEARED",
            RecordKind::Unknown => "",
            RecordKind::Other(s) => s,
        }
    }

    fn is_unknown(&self) -> bool {
        matches!(self, RecordKind::Unknown)
    }
}

impl From<String> for RecordKind {
    fn from(s: String) -> Self {
        RecordKind::parse(&s)
    }
}

impl From<RecordKind> for String {
    fn from(kind: RecordKind) -> Self {
        kind.as_str().to_string()
    }
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Status, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(|s| Status::parse(&s))
}

fn lenient_kind<'de, D>(deserializer: D) -> Result<RecordKind, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(|s| RecordKind::parse(&s))
}

/// One observation of one item in one run. Never mutated once written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,

    #[serde(default, alias = "secao", alias = "Seção", alias = "Section", deserialize_with = "lenient_string")]
    pub section: String,

    #[serde(default, alias = "nome", alias = "Produto", alias = "Name", deserialize_with = "lenient_string")]
    pub name: String,

    #[serde(default, alias = "preco", alias = "Preço", alias = "Price", deserialize_with = "lenient_string")]
    pub price: String,

    #[serde(default, alias = "descricao", alias = "Descrição", alias = "Description", deserialize_with = "lenient_string")]
    pub description: String,

    #[serde(default, alias = "Status", deserialize_with = "lenient_status")]
    pub status: Status,

    #[serde(default, alias = "tipo", deserialize_with = "lenient_kind", skip_serializing_if = "RecordKind::is_unknown")]
    pub kind: RecordKind,

    /// Fields this release does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// The element as it was read from disk, written back in its place.
    #[serde(skip)]
    pub raw: Option<Value>,
}

impl HistoryEntry {
    pub fn current(item: &Item, captured_at: &str) -> Self {
        HistoryEntry {
            timestamp: captured_at.to_string(),
            section: item.section.clone(),
            name: item.name.clone(),
            price: item.price.clone(),
            description: item.description_or_empty().to_string(),
            status: item.status.clone(),
            kind: RecordKind::Current,
            extra: Map::new(),
            raw: None,
        }
    }

    pub fn disappeared(gone: &DisappearedItem, captured_at: &str) -> Self {
        let status = match &gone.item.status {
            Status::Unknown => Status::OffDisappeared,
            other => other.clone(),
        };

        HistoryEntry {
            status,
            kind: RecordKind::Disappeared,
            ..HistoryEntry::current(&gone.item, captured_at)
        }
    }

    /// Objects that fail to parse keep their fields in `extra`; other values
    /// become empty entries. Either way the log keeps its length and the
    /// element is kept verbatim for the rewrite.
    fn from_value(value: Value) -> Self {
        let parsed = match &value {
            Value::Object(map) => serde_json::from_value(value.clone()).unwrap_or_else(|_| HistoryEntry {
                extra: map.clone(),
                ..HistoryEntry::default()
            }),
            _ => HistoryEntry::default(),
        };

        HistoryEntry {
            raw: Some(value),
            ..parsed
        }
    }
}

/// On-disk form of one entry.
#[derive(Serialize)]
#[serde(untagged)]
enum Stored<'a> {
    Loaded(&'a Value),
    Recorded(&'a HistoryEntry),
}

fn stored(entry: &HistoryEntry) -> Stored<'_> {
    match &entry.raw {
        Some(value) => Stored::Loaded(value),
        None => Stored::Recorded(entry),
    }
}

/// Every history layout seen in the wild, resolved once at load time.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    List(Vec<Value>),
    Wrapped {
        #[serde(alias = "registros")]
        records: Vec<Value>,
    },
    Keyed(Map<String, Value>),
}

impl StoredHistory {
    fn layout(&self) -> &'static str {
        match self {
            StoredHistory::List(_) => "list",
            StoredHistory::Wrapped { .. } => "records wrapper",
            StoredHistory::Keyed(_) => "keyed object",
        }
    }

    fn into_entries(self) -> Vec<HistoryEntry> {
        let values: Vec<Value> = match self {
            StoredHistory::List(values) => values,
            StoredHistory::Wrapped { records } => records,
            StoredHistory::Keyed(map) => map.into_iter().map(|(_, v)| v).collect(),
        };
        values.into_iter().map(HistoryEntry::from_value).collect()
    }
}

pub fn read_history(path: &Path) -> Result<Vec<HistoryEntry>, PersistenceError> {
    let text = super::read_text(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|source| PersistenceError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let stored: StoredHistory = serde_json::from_value(value).map_err(|_| PersistenceError::Shape {
        path: path.to_path_buf(),
        expected: "a list of records or an object of records",
    })?;

    let layout = stored.layout();
    let entries = stored.into_entries();
    if layout != "list" {
        info!(layout, records = entries.len(), "history converted to list layout");
    }
    Ok(entries)
}

/// Loads the history log, falling back to an empty one.
pub fn load_history(path: &Path) -> Vec<HistoryEntry> {
    match read_history(path) {
        Ok(entries) => {
            info!(records = entries.len(), path = %path.display(), "history loaded");
            entries
        }
        Err(e) if e.is_not_found() => {
            warn!(path = %path.display(), "no history found, a new one will be created");
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "history unusable, a new one will be created");
            Vec::new()
        }
    }
}

/// Result of an append. `entries` always holds the grown log, even when it
/// could not be written to disk.
#[derive(Debug)]
pub struct Appended {
    pub entries: Vec<HistoryEntry>,
    pub persisted: Result<(), PersistenceError>,
}

/// Appends one `CURRENT` entry per item, then one `DISAPPEARED` entry per
/// missing item, and writes the whole log back.
pub fn append_history(
    path: &Path,
    existing: Vec<HistoryEntry>,
    current: &[Item],
    disappeared: &[DisappearedItem],
    captured_at: &str,
) -> Appended {
    let mut entries = existing;
    entries.reserve(current.len() + disappeared.len());

    entries.extend(current.iter().map(|item| HistoryEntry::current(item, captured_at)));
    entries.extend(disappeared.iter().map(|gone| HistoryEntry::disappeared(gone, captured_at)));

    let persisted = super::write_json(path, &entries.iter().map(stored).collect::<Vec<_>>());
    match &persisted {
        Ok(()) => info!(records = entries.len(), path = %path.display(), "history saved"),
        Err(e) => warn!(error = %e, "history not saved, continuing with in-memory log"),
    }

    Appended { entries, persisted }
}
