//! Plain-text alert body.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset};

use crate::model::{Item, Status};
use crate::store::diff::DisappearedItem;

/// Problem lines listed before the rest is collapsed into a count.
pub const MAX_LISTED: usize = 10;

const NO_SECTION: &str = "(no section)";

pub struct AlertInput<'a> {
    pub at: &'a DateTime<FixedOffset>,
    pub active_count: usize,
    pub off_items: &'a [Item],
    pub disappeared_items: &'a [DisappearedItem],
    /// Every item of the current feed.
    pub current_items: &'a [Item],
    pub dashboard_published: bool,
}

#[derive(Default)]
struct SectionTally {
    on: usize,
    off: usize,
    disappeared: usize,
}

fn section_label(section: &str) -> &str {
    match section.trim() {
        "" => NO_SECTION,
        trimmed => trimmed,
    }
}

fn section_breakdown(input: &AlertInput<'_>) -> String {
    let mut tallies: BTreeMap<&str, SectionTally> = BTreeMap::new();

    let everything = input
        .current_items
        .iter()
        .chain(input.disappeared_items.iter().map(|d| &d.item));
    for item in everything {
        let tally = tallies.entry(section_label(&item.section)).or_default();
        match item.status {
            Status::On => tally.on += 1,
            Status::OffDisappeared => {
                tally.off += 1;
                tally.disappeared += 1;
            }
            _ => tally.off += 1,
        }
    }

    if tallies.is_empty() {
        return "(no section data)".to_string();
    }

    let mut out = String::from("📊 Status by section:");
    for (section, t) in &tallies {
        let _ = write!(
            out,
            "\n- {section}: 🟢 {} ON | 🔴 {} OFF (includes {} disappeared)",
            t.on, t.off, t.disappeared
        );
    }
    out
}

pub fn compose(input: &AlertInput<'_>) -> String {
    let total_off = input.off_items.len() + input.disappeared_items.len();
    let mut lines: Vec<String> = vec![
        "🚨 ALERT: Menu Item Monitor 🚨\n".to_string(),
        format!("Date/Time: {}\n", input.at.format("%d/%m/%Y %H:%M:%S")),
        format!("✅ Active items on the menu (ON): {}\n", input.active_count),
    ];

    if total_off > 0 {
        lines.push(format!("⚠️ {total_off} items with problems (OFF or disappeared):"));

        let problems = input
            .off_items
            .iter()
            .chain(input.disappeared_items.iter().map(|d| &d.item));
        for item in problems.take(MAX_LISTED) {
            lines.push(format!(
                "- {} – {} – Price: {}",
                section_label(&item.section),
                item.name,
                item.price
            ));
        }

        if total_off > MAX_LISTED {
            lines.push(format!("... and {} more items\n", total_off - MAX_LISTED));
        } else {
            lines.push(String::new());
        }
    } else {
        lines.push("✅ No items OFF or disappeared.\n".to_string());
    }

    lines.push(section_breakdown(input));
    lines.push(String::new());
    lines.push(format!(
        "Total of {total_off} items with problems (OFF or disappeared). Check the full report."
    ));

    if input.dashboard_published {
        lines.push("\n🔗 HTML dashboard available in the repository.".to_string());
    }

    lines.join("\n")
}
