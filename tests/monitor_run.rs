use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, TimeZone};
use menuwatch::config::{Config, FileConfig};
use menuwatch::error::IngestError;
use menuwatch::model::Status;
use menuwatch::monitor::{self, MonitorOutcome};
use menuwatch::notify::Notifier;
use menuwatch::store::history::{self, RecordKind};
use menuwatch::sync::RemoteSync;
use tempfile::TempDir;

const HEADER: &str = "section,name,price,description,status\n";

/// Records every call, never touches the network.
#[derive(Default)]
struct RecordingSync {
    downloads: RefCell<Vec<PathBuf>>,
    uploads: RefCell<Vec<String>>,
}

impl RemoteSync for RecordingSync {
    fn download(&self, local_path: &Path) -> bool {
        self.downloads.borrow_mut().push(local_path.to_path_buf());
        false
    }

    fn upload(&self, local_path: &Path, remote_name: &str) -> bool {
        assert!(local_path.exists(), "uploaded a file that was never written");
        self.uploads.borrow_mut().push(remote_name.to_string());
        true
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn send(&self, text: &str) {
        self.sent.borrow_mut().push(text.to_string());
    }
}

fn config(dir: &TempDir) -> Config {
    Config::resolve(dir.path().to_path_buf(), FileConfig::default(), |_| None).unwrap()
}

fn write_feed(config: &Config, rows: &[&str]) {
    fs::create_dir_all(config.data_path.parent().unwrap()).unwrap();
    let mut body = HEADER.to_string();
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    fs::write(&config.data_path, body).unwrap();
}

fn at(day: u32) -> DateTime<FixedOffset> {
    FixedOffset::west_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 6, day, 8, 0, 0)
        .unwrap()
}

fn run(config: &Config, day: u32) -> (MonitorOutcome, RecordingSync, RecordingNotifier) {
    let sync = RecordingSync::default();
    let notifier = RecordingNotifier::default();
    let outcome = monitor::run(config, &sync, &notifier, at(day)).unwrap();
    (outcome, sync, notifier)
}

fn names<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    items.collect()
}

#[test]
fn first_run_has_no_disappeared_items() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    write_feed(
        &config,
        &["Pizzas,Margherita,39.90,Basil,ON", "Pizzas,Calzone,45.00,,OFF", "Drinks,Cola,6.00,,on"],
    );

    let (outcome, sync, notifier) = run(&config, 1);

    assert_eq!(outcome.captured_at, "2025-06-01 08:00:00");
    assert_eq!(outcome.total_items, 3);
    assert_eq!(outcome.active_items, 2);
    assert_eq!(names(outcome.off_items.iter().map(|i| i.name.as_str())), vec!["Calzone"]);
    assert!(outcome.disappeared_items.is_empty());
    assert_eq!(outcome.history_len, 3);
    assert!(outcome.diagnostics.is_empty());

    // state and history are pulled before anything else
    assert_eq!(*sync.downloads.borrow(), vec![config.state_path.clone(), config.history_path.clone()]);
    assert_eq!(
        *sync.uploads.borrow(),
        vec!["item_state.json", "status_history.json", "index.html", "items_report.xlsx"]
    );
    assert_eq!(outcome.published.uploads, 4);

    assert!(config.state_path.is_file());
    assert!(config.dashboard_path.is_file());
    assert!(config.report_path.is_file());

    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Active items on the menu (ON): 2"));
    assert!(sent[0].contains("- Pizzas – Calzone – Price: 45.00"));
}

#[test]
fn item_missing_from_second_run_is_reported_once() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);

    write_feed(&config, &["Pizzas,Margherita,39.90,,ON", "Japanese,Temaki,27.00,Salmon,ON"]);
    run(&config, 1);

    write_feed(&config, &["Pizzas,Margherita,39.90,,ON"]);
    let (second, _, notifier) = run(&config, 2);

    assert_eq!(second.disappeared_items.len(), 1);
    let gone = &second.disappeared_items[0];
    assert_eq!(gone.item.section, "Japanese");
    assert_eq!(gone.item.name, "Temaki");
    assert_eq!(gone.item.price, "27.00");
    assert_eq!(gone.item.status, Status::OffDisappeared);
    assert_eq!(gone.last_seen, "2025-06-01 08:00:00");
    // the feed itself is all ON
    assert_eq!(second.active_items, 1);
    assert_eq!(second.history_len, 2 + 1 + 1);
    assert_eq!(second.summary.ever_disappeared_count, 1);
    assert!(notifier.sent.borrow()[0].contains("- Japanese – Temaki – Price: 27.00"));

    // the snapshot was replaced, so a third run sees nothing new missing
    let (third, _, _) = run(&config, 3);
    assert!(third.disappeared_items.is_empty());
    assert_eq!(third.history_len, 4 + 1);
    assert_eq!(third.summary.ever_disappeared_count, 1);

    let log = history::read_history(&config.history_path).unwrap();
    assert_eq!(log.len(), 5);
    let disappeared: Vec<_> = log.iter().filter(|e| e.kind == RecordKind::Disappeared).collect();
    assert_eq!(disappeared.len(), 1);
    assert_eq!(disappeared[0].timestamp, "2025-06-02 08:00:00");
}

#[test]
fn diff_against_seeded_snapshot() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    fs::write(
        &config.state_path,
        r#"{
            "Pizzas|Margherita": {"Section": "Pizzas", "Name": "Margherita", "Price": "39.90", "Status": "ON", "LastChecked": "2025-05-31 08:00:00"},
            "Pizzas|Sushi": {"Seção": "Pizzas", "Produto": "Sushi", "Preço": 52, "Status": "ON"}
        }"#,
    )
    .unwrap();
    write_feed(&config, &["Pizzas,Margherita,39.90,,ON", "Pizzas,Calzone,45.00,,OFF"]);

    let (outcome, _, _) = run(&config, 1);

    assert_eq!(names(outcome.off_items.iter().map(|i| i.name.as_str())), vec!["Calzone"]);
    assert_eq!(outcome.disappeared_items.len(), 1);
    let sushi = &outcome.disappeared_items[0];
    assert_eq!(sushi.item.name, "Sushi");
    assert_eq!(sushi.item.price, "52");
    // no capture time in the old record, so the run time stands in
    assert_eq!(sushi.last_seen, "2025-06-01 08:00:00");
}

#[test]
fn legacy_history_is_rewritten_as_a_list() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    fs::write(
        &config.history_path,
        r#"{"registros": [
            {"timestamp": "2025-05-01 08:00:00", "secao": "Pizzas", "nome": "Calzone", "preco": 45, "status": "OFF", "tipo": "ATUAL"}
        ]}"#,
    )
    .unwrap();
    write_feed(&config, &["Pizzas,Calzone,45.00,,ON"]);

    let (outcome, _, _) = run(&config, 1);
    assert_eq!(outcome.history_len, 2);

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&config.history_path).unwrap()).unwrap();
    let list = raw.as_array().expect("history is written as a list");
    assert_eq!(list.len(), 2);
    // the legacy entry keeps its own field names
    assert_eq!(list[0]["nome"], "Calzone");
    assert_eq!(list[0]["preco"], 45);
    assert_eq!(list[0]["tipo"], "ATUAL");
    assert!(list[0].get("kind").is_none());
    assert_eq!(list[1]["name"], "Calzone");
    assert_eq!(list[1]["kind"], "CURRENT");
    assert_eq!(list[1]["timestamp"], "2025-06-01 08:00:00");
}

#[test]
fn empty_feed_and_empty_state() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    write_feed(&config, &[]);

    let (outcome, _, notifier) = run(&config, 1);

    assert_eq!(outcome.total_items, 0);
    assert!(outcome.off_items.is_empty());
    assert!(outcome.disappeared_items.is_empty());
    assert_eq!(outcome.summary.total_records, 0);
    assert_eq!(outcome.summary.active_count, 0);
    assert_eq!(outcome.summary.as_of, "2025-06-01 08:00:00");
    assert!(notifier.sent.borrow()[0].contains("No items OFF or disappeared"));
}

#[test]
fn missing_feed_aborts_before_publishing() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let sync = RecordingSync::default();
    let notifier = RecordingNotifier::default();

    let result = monitor::run(&config, &sync, &notifier, at(1));

    assert!(matches!(result, Err(IngestError::Open { .. })));
    assert_eq!(sync.downloads.borrow().len(), 2);
    assert!(sync.uploads.borrow().is_empty());
    assert!(notifier.sent.borrow().is_empty());
    assert!(!config.state_path.exists());
}

#[test]
fn feed_without_required_columns_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    fs::create_dir_all(config.data_path.parent().unwrap()).unwrap();
    fs::write(&config.data_path, "section,name\nPizzas,Margherita\n").unwrap();

    let result = monitor::run(&config, &RecordingSync::default(), &RecordingNotifier::default(), at(1));

    assert!(matches!(result, Err(IngestError::MissingColumns { .. })));
}

#[test]
fn failed_write_does_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    // a directory where the dashboard file should go
    config.dashboard_path = dir.path().join("site");
    fs::create_dir_all(&config.dashboard_path).unwrap();
    write_feed(&config, &["Pizzas,Margherita,39.90,,ON"]);

    let (outcome, sync, notifier) = run(&config, 1);

    assert!(!outcome.published.dashboard);
    assert!(outcome.published.snapshot);
    assert!(outcome.published.spreadsheet);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].starts_with("dashboard:"));
    assert!(!sync.uploads.borrow().iter().any(|n| n == "site"));
    // no dashboard hint when the dashboard was not written
    assert!(!notifier.sent.borrow()[0].contains("dashboard"));
}
