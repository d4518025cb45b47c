//! Terminal table for a monitoring run.
//!
//! - headline counts for the run
//! - problem items, OFF first, then disappeared
//! - per-section counts from the summary, sorted by section

use std::fmt::Write as _;

use crate::monitor::MonitorOutcome;
use crate::util::truncate;

const NAME_WIDTH: usize = 30;

pub fn render(outcome: &MonitorOutcome) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "\n{} items, {} ON, {} OFF, {} disappeared",
        outcome.total_items,
        outcome.active_items,
        outcome.off_items.len(),
        outcome.disappeared_items.len()
    );

    if outcome.problem_count() == 0 {
        output.push_str("All items are ON and none disappeared.\n");
    } else {
        output.push_str("\nProblems\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');

        for item in &outcome.off_items {
            let _ = writeln!(
                output,
                "  {:20} {:30} {:>10}  {}",
                truncate(&item.section, 20),
                truncate(&item.name, NAME_WIDTH),
                item.price,
                item.status
            );
        }
        for gone in &outcome.disappeared_items {
            let _ = writeln!(
                output,
                "  {:20} {:30} {:>10}  last seen {}",
                truncate(&gone.item.section, 20),
                truncate(&gone.item.name, NAME_WIDTH),
                gone.item.price,
                gone.last_seen
            );
        }
    }

    let summary = &outcome.summary;
    if summary.per_section.is_empty() {
        return output;
    }

    let _ = writeln!(output, "\n{:30} {:>6} {:>6} {:>6} {:>6}", "Section", "total", "on", "off", "gone");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    for (section, counts) in summary.sections() {
        let _ = writeln!(
            output,
            "  {:28} {:>6} {:>6} {:>6} {:>6}",
            truncate(section, 28),
            counts.total,
            counts.on,
            counts.off,
            counts.disappeared
        );
    }

    let _ = writeln!(
        output,
        "\n{:>60}",
        format!("ever disappeared: {}", summary.ever_disappeared_count)
    );

    output
}
