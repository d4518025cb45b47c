//! One monitoring run, start to finish.
//!
//! Only ingesting the item feed can fail the run. Every later step is
//! guarded on its own: a failure is logged, recorded as a diagnostic and
//! the next step still runs.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{IngestError, PersistenceError};
use crate::feed;
use crate::model::Item;
use crate::notify::message::{self, AlertInput};
use crate::notify::Notifier;
use crate::report::{dashboard, spreadsheet};
use crate::store::diff::{self, DisappearedItem};
use crate::store::{history, snapshot};
use crate::summary::{self, Summary};
use crate::sync::{self, RemoteSync};
use crate::util;

/// Which outputs were written locally and pushed to the remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Published {
    pub snapshot: bool,
    pub history: bool,
    pub dashboard: bool,
    pub spreadsheet: bool,
    pub uploads: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorOutcome {
    pub captured_at: String,
    pub total_items: usize,
    pub active_items: usize,
    pub off_items: Vec<Item>,
    pub disappeared_items: Vec<DisappearedItem>,
    pub history_len: usize,
    pub summary: Summary,
    pub published: Published,
    pub diagnostics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    /// Resident memory sampled as the run finishes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_bytes: Option<usize>,
}

impl MonitorOutcome {
    pub fn problem_count(&self) -> usize {
        self.off_items.len() + self.disappeared_items.len()
    }
}

/// Logs a failed write and keeps it for the run report.
fn record(diagnostics: &mut Vec<String>, what: &str, result: Result<(), PersistenceError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "failed to write {what}");
            diagnostics.push(format!("{what}: {e}"));
            false
        }
    }
}

fn push(sync: &dyn RemoteSync, path: &Path, published: &mut Published) {
    if sync.upload(path, &sync::remote_name(path)) {
        published.uploads += 1;
    }
}

pub fn run(
    config: &Config,
    sync: &dyn RemoteSync,
    notifier: &dyn Notifier,
    started_at: DateTime<FixedOffset>,
) -> Result<MonitorOutcome, IngestError> {
    let start = Instant::now();
    let captured_at = util::format_timestamp(&started_at);
    info!(at = %captured_at, feed = %config.data_path.display(), "monitoring run started");

    let mut diagnostics = Vec::new();
    let mut published = Published::default();

    // pull the previous state so runs on fresh machines keep their history
    sync.download(&config.state_path);
    sync.download(&config.history_path);

    let prior = snapshot::load_snapshot(&config.state_path);

    let current = match feed::load_items(&config.data_path) {
        Ok(items) => items,
        Err(e) => {
            error!(error = %e, "item feed could not be loaded, aborting run");
            return Err(e);
        }
    };

    let result = diff::diff(&current, &prior, &captured_at);
    for key in &result.shadowed {
        warn!(key = %key, "duplicate item in feed, keeping the last occurrence");
    }
    if result.disappeared_items.is_empty() {
        info!("no items disappeared since the previous run");
    } else {
        warn!(count = result.disappeared_items.len(), "items disappeared since the previous run");
    }

    published.snapshot = record(
        &mut diagnostics,
        "snapshot",
        snapshot::write_snapshot(&config.state_path, &current, &captured_at),
    );
    if published.snapshot {
        push(sync, &config.state_path, &mut published);
    }

    let existing = history::load_history(&config.history_path);
    let appended = history::append_history(
        &config.history_path,
        existing,
        &current,
        &result.disappeared_items,
        &captured_at,
    );
    published.history = record(&mut diagnostics, "history", appended.persisted);
    if published.history {
        push(sync, &config.history_path, &mut published);
    }
    let entries = appended.entries;

    let summary = summary::summarize(&entries, &captured_at);

    published.dashboard = record(
        &mut diagnostics,
        "dashboard",
        dashboard::write(&config.dashboard_path, &summary),
    );
    if published.dashboard {
        info!(path = %config.dashboard_path.display(), "dashboard written");
        push(sync, &config.dashboard_path, &mut published);
    }

    published.spreadsheet = record(
        &mut diagnostics,
        "spreadsheet",
        spreadsheet::write(&config.report_path, &current, &result.disappeared_items),
    );
    if published.spreadsheet {
        push(sync, &config.report_path, &mut published);
    }

    let total_items = current.len();
    // disappeared items are not part of the feed, so they do not reduce it
    let active_items = total_items.saturating_sub(result.off_items.len());

    let text = message::compose(&AlertInput {
        at: &started_at,
        active_count: active_items,
        off_items: &result.off_items,
        disappeared_items: &result.disappeared_items,
        current_items: &current,
        dashboard_published: published.dashboard,
    });
    notifier.send(&text);

    let outcome = MonitorOutcome {
        captured_at,
        total_items,
        active_items,
        off_items: result.off_items,
        disappeared_items: result.disappeared_items,
        history_len: entries.len(),
        summary,
        published,
        diagnostics,
        duration_ms: Some(start.elapsed().as_millis()),
        memory_bytes: memory_stats::memory_stats().map(|m| m.physical_mem),
    };

    info!(
        total = outcome.total_items,
        active = outcome.active_items,
        off = outcome.off_items.len(),
        disappeared = outcome.disappeared_items.len(),
        history = outcome.history_len,
        uploads = outcome.published.uploads,
        memory_bytes = outcome.memory_bytes,
        "monitoring run finished"
    );
    Ok(outcome)
}
