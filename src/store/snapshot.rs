use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::PersistenceError;
use crate::model::Item;
use crate::util::lenient_opt_string;

/// One persisted item record. Field names are display-cased on disk; the
/// aliases cover files written by older releases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(rename = "Section", alias = "Seção", default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    #[serde(rename = "Name", alias = "Produto", default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "Price", alias = "Preço", default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    #[serde(rename = "Description", alias = "Descrição", default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Status", default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(rename = "LastChecked", alias = "Última verificação", default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,
}

impl SnapshotRecord {
    fn from_item(item: &Item, captured_at: &str) -> Self {
        SnapshotRecord {
            section: Some(item.section.clone()),
            name: Some(item.name.clone()),
            price: Some(item.price.clone()),
            description: Some(item.description_or_empty().to_string()),
            status: Some(item.status.to_string()),
            last_checked: Some(captured_at.to_string()),
        }
    }

    /// Inner records are not validated; anything unparseable becomes an
    /// empty record so the key still takes part in the diff.
    fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// Last known state of the catalog, keyed by `section|name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: BTreeMap<String, SnapshotRecord>,
}

impl Snapshot {
    /// Builds the snapshot for this run. Duplicate keys keep the last item.
    pub fn from_items(items: &[Item], captured_at: &str) -> Self {
        let records = items
            .iter()
            .map(|item| (item.key().as_str().to_string(), SnapshotRecord::from_item(item, captured_at)))
            .collect();
        Snapshot { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&SnapshotRecord> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, record: SnapshotRecord) {
        self.records.insert(key.into(), record);
    }

    /// Iterates records in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SnapshotRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Reads a snapshot file. Missing file, bad json and non-object shapes are
/// distinct errors so the caller can tell a first run from corruption.
pub fn read_snapshot(path: &Path) -> Result<Snapshot, PersistenceError> {
    let text = super::read_text(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|source| PersistenceError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Object(map) = value else {
        return Err(PersistenceError::Shape {
            path: path.to_path_buf(),
            expected: "an object keyed by section|name",
        });
    };

    let records = map
        .into_iter()
        .map(|(key, value)| (key, SnapshotRecord::from_value(value)))
        .collect();

    Ok(Snapshot { records })
}

/// Loads the previous snapshot, falling back to an empty one.
pub fn load_snapshot(path: &Path) -> Snapshot {
    match read_snapshot(path) {
        Ok(snapshot) => {
            info!(records = snapshot.len(), path = %path.display(), "previous snapshot loaded");
            snapshot
        }
        Err(e) if e.is_not_found() => {
            warn!(path = %path.display(), "no previous snapshot found, this looks like the first run");
            Snapshot::default()
        }
        Err(e) => {
            warn!(error = %e, "previous snapshot unusable, starting from an empty one");
            Snapshot::default()
        }
    }
}

/// Replaces the snapshot file with the state of `items`.
pub fn write_snapshot(path: &Path, items: &[Item], captured_at: &str) -> Result<(), PersistenceError> {
    let snapshot = Snapshot::from_items(items, captured_at);
    super::write_json(path, &snapshot)?;
    info!(records = snapshot.len(), path = %path.display(), "current snapshot saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use std::fs;

    fn item(section: &str, name: &str, price: &str, status: Status) -> Item {
        Item {
            section: section.to_string(),
            name: name.to_string(),
            price: price.to_string(),
            description: Some(format!("{name} description")),
            status,
        }
    }

    #[test]
    fn write_then_load_round_trips_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let items = vec![
            item("Pizzas", "Margherita", "39.90", Status::On),
            item("Drinks", "Cola", "6.00", Status::Off),
        ];

        write_snapshot(&path, &items, "2025-05-01 10:00:00").unwrap();
        let snapshot = load_snapshot(&path);

        assert_eq!(snapshot.len(), 2);
        let record = snapshot.get("Pizzas|Margherita").unwrap();
        assert_eq!(record.section.as_deref(), Some("Pizzas"));
        assert_eq!(record.name.as_deref(), Some("Margherita"));
        assert_eq!(record.price.as_deref(), Some("39.90"));
        assert_eq!(record.description.as_deref(), Some("Margherita description"));
        assert_eq!(record.status.as_deref(), Some("ON"));
        assert_eq!(record.last_checked.as_deref(), Some("2025-05-01 10:00:00"));
        assert_eq!(snapshot.get("Drinks|Cola").unwrap().status.as_deref(), Some("OFF"));
    }

    #[test]
    fn written_file_uses_display_cased_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_snapshot(&path, &[item("Pizzas", "Calzone", "45", Status::Off)], "2025-05-01 10:00:00").unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let record = &raw["Pizzas|Calzone"];
        for field in ["Section", "Name", "Price", "Description", "Status", "LastChecked"] {
            assert!(record.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn each_write_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        write_snapshot(&path, &[item("A", "x", "1", Status::On)], "t1").unwrap();
        write_snapshot(&path, &[item("B", "y", "2", Status::On)], "t2").unwrap();

        let snapshot = load_snapshot(&path);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key("B|y"));
        assert!(!snapshot.contains_key("A|x"));
    }

    #[test]
    fn duplicate_keys_keep_last_item() {
        let items = vec![
            item("Pizzas", "Calzone", "40", Status::On),
            item("Pizzas", "Calzone", "42", Status::Off),
        ];
        let snapshot = Snapshot::from_items(&items, "t");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("Pizzas|Calzone").unwrap().price.as_deref(), Some("42"));
    }

    #[test]
    fn missing_file_is_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        assert!(read_snapshot(&path).unwrap_err().is_not_found());
        assert!(load_snapshot(&path).is_empty());
    }

    #[test]
    fn non_object_file_is_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(read_snapshot(&path), Err(PersistenceError::Shape { .. })));
        assert!(load_snapshot(&path).is_empty());
    }

    #[test]
    fn corrupt_file_is_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(read_snapshot(&path), Err(PersistenceError::Json { .. })));
        assert!(load_snapshot(&path).is_empty());
    }

    #[test]
    fn legacy_field_names_and_numeric_prices_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(
            &path,
            r#"{
                "Pizzas|Sushi": {
                    "Seção": "Pizzas",
                    "Produto": "Sushi",
                    "Preço": 29.5,
                    "Descrição": null,
                    "Status": "ON",
                    "Última verificação": "2025-01-01 08:00:00"
                }
            }"#,
        )
        .unwrap();

        let snapshot = read_snapshot(&path).unwrap();
        let record = snapshot.get("Pizzas|Sushi").unwrap();
        assert_eq!(record.price.as_deref(), Some("29.5"));
        assert_eq!(record.description, None);
        assert_eq!(record.last_checked.as_deref(), Some("2025-01-01 08:00:00"));
    }

    #[test]
    fn malformed_inner_record_keeps_its_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"Pizzas|Odd": 42, "Pizzas|Ok": {"Price": "10"}}"#).unwrap();

        let snapshot = read_snapshot(&path).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("Pizzas|Odd"), Some(&SnapshotRecord::default()));
        assert_eq!(snapshot.get("Pizzas|Ok").unwrap().price.as_deref(), Some("10"));
    }
}
