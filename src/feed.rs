//! Item feed ingestion.
//!
//! Reads the catalog CSV into `Item`s. Headers are matched case-insensitively
//! and a few legacy column names are accepted. A missing column or an
//! unreadable file is the one fatal error of a run.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::IngestError;
use crate::model::{Item, Status};

const REQUIRED_COLUMNS: [&str; 5] = ["section", "name", "price", "description", "status"];

/// Legacy header -> canonical column.
const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("product", "name"),
    ("produto", "name"),
    ("nome", "name"),
    ("category", "section"),
    ("seção", "section"),
    ("secao", "section"),
    ("preço", "price"),
    ("preco", "price"),
    ("descrição", "description"),
    ("descricao", "description"),
];

/// Maps canonical column names to their index in the header row.
fn resolve_columns(headers: &csv::StringRecord) -> HashMap<&'static str, usize> {
    let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut columns = HashMap::new();

    // canonical names first so they win over an alias for the same column
    for canonical in REQUIRED_COLUMNS {
        if let Some(idx) = normalized.iter().position(|h| h == canonical) {
            columns.insert(canonical, idx);
        }
    }

    for (alias, canonical) in COLUMN_ALIASES {
        if columns.contains_key(canonical) {
            continue;
        }
        if let Some(idx) = normalized.iter().position(|h| h == alias) {
            debug!(alias, canonical, "mapped legacy column name");
            columns.insert(*canonical, idx);
        }
    }

    columns
}

pub fn load_items(path: &Path) -> Result<Vec<Item>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|source| IngestError::Open { path: path.to_path_buf(), source })?;

    let headers = reader
        .headers()
        .map_err(|source| IngestError::Header { path: path.to_path_buf(), source })?
        .clone();

    let columns = resolve_columns(&headers);

    let mut missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !columns.contains_key(*c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(IngestError::MissingColumns { path: path.to_path_buf(), missing });
    }

    let field = |record: &csv::StringRecord, column: &str| -> String {
        columns
            .get(column)
            .and_then(|idx| record.get(*idx))
            .unwrap_or_default()
            .to_string()
    };

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Row { path: path.to_path_buf(), source })?;

        let description = field(&record, "description");
        items.push(Item {
            section: field(&record, "section"),
            name: field(&record, "name"),
            price: field(&record, "price"),
            description: (!description.is_empty()).then_some(description),
            status: Status::parse(&field(&record, "status")),
        });
    }

    info!(items = items.len(), path = %path.display(), "item feed loaded");
    Ok(items)
}
