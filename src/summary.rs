//! Aggregated view of the history log for the dashboard.
//!
//! ON/OFF counts come from the latest run only; "ever disappeared" counts
//! span the whole log, one per `(section, name)`.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::store::history::{HistoryEntry, RecordKind};

/// Section label for entries recorded without one.
pub const UNKNOWN_SECTION: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionCounts {
    pub total: usize,
    pub on: usize,
    pub off: usize,
    pub disappeared: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub as_of: String,
    pub total_records: usize,
    pub active_count: usize,
    pub off_count: usize,
    pub ever_disappeared_count: usize,
    pub per_section: BTreeMap<String, SectionCounts>,
}

impl Summary {
    /// Rows sorted by section name.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &SectionCounts)> {
        self.per_section.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Builds the summary. `fallback_as_of` is only used when `history` is empty.
pub fn summarize(history: &[HistoryEntry], fallback_as_of: &str) -> Summary {
    if history.is_empty() {
        return Summary {
            as_of: fallback_as_of.to_string(),
            ..Summary::default()
        };
    }

    // timestamps are sortable text, so the lexical max is the latest run
    let latest = history
        .iter()
        .map(|e| e.timestamp.as_str())
        .max()
        .unwrap_or_default();

    let is_current = |e: &&HistoryEntry| e.kind == RecordKind::Current;

    let mut last_run: Vec<&HistoryEntry> = history
        .iter()
        .filter(|e| e.timestamp == latest)
        .filter(is_current)
        .collect();

    if last_run.is_empty() {
        last_run = history.iter().filter(is_current).collect();
    }

    let mut per_section: BTreeMap<String, SectionCounts> = BTreeMap::new();
    let mut active_count = 0;
    let mut off_count = 0;

    for entry in last_run {
        let section = if entry.section.is_empty() {
            UNKNOWN_SECTION
        } else {
            entry.section.as_str()
        };
        let counts = per_section.entry(section.to_string()).or_default();

        if entry.status.is_on() {
            active_count += 1;
            counts.on += 1;
        } else {
            off_count += 1;
            counts.off += 1;
        }
        counts.total += 1;
    }

    let ever_disappeared: BTreeSet<(&str, &str)> = history
        .iter()
        .filter(|e| e.kind == RecordKind::Disappeared)
        .map(|e| (e.section.as_str(), e.name.as_str()))
        .collect();

    for (section, _) in &ever_disappeared {
        if !section.is_empty() {
            per_section.entry(section.to_string()).or_default().disappeared += 1;
        }
    }

    Summary {
        as_of: if latest.is_empty() { fallback_as_of.to_string() } else { latest.to_string() },
        total_records: history.len(),
        active_count,
        off_count,
        ever_disappeared_count: ever_disappeared.len(),
        per_section,
    }
}
