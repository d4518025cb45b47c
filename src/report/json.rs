//! JSON output for a monitoring run.
//!
//! Serializes `MonitorOutcome` for scripting and piping.

use crate::monitor::MonitorOutcome;

pub fn render(outcome: &MonitorOutcome) -> String {
    serde_json::to_string_pretty(outcome).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, Status};
    use crate::monitor::Published;
    use crate::store::diff::DisappearedItem;
    use crate::summary::Summary;

    fn outcome() -> MonitorOutcome {
        MonitorOutcome {
            captured_at: "2025-06-02 08:30:05".to_string(),
            total_items: 0,
            active_items: 0,
            off_items: Vec::new(),
            disappeared_items: Vec::new(),
            history_len: 0,
            summary: Summary::default(),
            published: Published::default(),
            diagnostics: Vec::new(),
            duration_ms: None,
            memory_bytes: None,
        }
    }

    #[test]
    fn renders_outcome_fields() {
        let gone = Item {
            section: "Pizzas".to_string(),
            name: "Sushi".to_string(),
            price: "N/A".to_string(),
            description: None,
            status: Status::OffDisappeared,
        };
        let outcome = MonitorOutcome {
            total_items: 1,
            active_items: 1,
            disappeared_items: vec![DisappearedItem {
                item: gone,
                last_seen: "2025-06-01 08:30:00".to_string(),
            }],
            history_len: 2,
            ..outcome()
        };

        let value: serde_json::Value = serde_json::from_str(&render(&outcome)).unwrap();

        assert_eq!(value["total_items"], 1);
        assert_eq!(value["active_items"], 1);
        assert_eq!(value["captured_at"], "2025-06-02 08:30:05");
        assert_eq!(value["disappeared_items"][0]["name"], "Sushi");
        assert_eq!(value["disappeared_items"][0]["status"], "OFF (Disappeared)");
        assert_eq!(value["disappeared_items"][0]["last_seen"], "2025-06-01 08:30:00");
        assert!(value.get("duration_ms").is_none());
        assert!(value.get("memory_bytes").is_none());
    }

    #[test]
    fn memory_is_reported_as_sampled_at_exit() {
        let outcome = MonitorOutcome {
            duration_ms: Some(1_250),
            memory_bytes: Some(48 * 1024 * 1024),
            ..outcome()
        };

        let value: serde_json::Value = serde_json::from_str(&render(&outcome)).unwrap();

        assert_eq!(value["duration_ms"], 1_250);
        assert_eq!(value["memory_bytes"], 48 * 1024 * 1024);
        assert!(value.get("peak_memory_bytes").is_none());
    }
}
