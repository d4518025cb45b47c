pub mod dashboard;
pub mod json;
pub mod spreadsheet;
pub mod table;

use crate::config::Config;
use crate::monitor::MonitorOutcome;

pub fn print(outcome: &MonitorOutcome, config: &Config) {
    if config.json_output {
        println!("{}", json::render(outcome));
    } else {
        print!("{}", table::render(outcome));
        print_run_info(outcome, config.verbose);
        print_diagnostics(outcome, config.verbose);
    }
}

fn print_run_info(outcome: &MonitorOutcome, verbose: bool) {
    if let Some(duration_ms) = outcome.duration_ms {
        let duration_sec = duration_ms as f64 / 1000.0;
        println!("\nrun completed in {duration_sec:.2}s ({})", outcome.captured_at);

        if verbose {
            if let Some(bytes) = outcome.memory_bytes {
                println!("memory at exit: {:.1} MB", bytes as f64 / 1_024_f64 / 1_024_f64);
            }

            let p = &outcome.published;
            println!(
                "written: snapshot={} history={} dashboard={} spreadsheet={}, uploads: {}",
                p.snapshot, p.history, p.dashboard, p.spreadsheet, p.uploads
            );
            println!("history records: {}", outcome.history_len);
        }
    }
}

fn print_diagnostics(outcome: &MonitorOutcome, verbose: bool) {
    if outcome.diagnostics.is_empty() {
        return;
    }

    println!();
    if verbose {
        println!("Diagnostics:");
        println!("{}", "-".repeat(40));
        for diagnostic in &outcome.diagnostics {
            println!("  {diagnostic}");
        }
    } else {
        for diagnostic in &outcome.diagnostics {
            println!("[diagnostic] {diagnostic}");
        }
    }
}
