//! Static HTML dashboard.
//!
//! Renders a `Summary` into a single self-contained page:
//! - four headline cards (history size, ON / OFF in the last run, ever disappeared)
//! - a per-section table sorted by section name

use std::fmt::Write as _;
use std::path::Path;

use crate::error::PersistenceError;
use crate::summary::Summary;

const STYLE: &str = r#"
        :root {
            --bg-card: #0b1020;
            --bg-card-alt: #111827;
            --accent: #22c55e;
            --accent-red: #ef4444;
            --accent-yellow: #eab308;
            --text-main: #f9fafb;
            --text-muted: #9ca3af;
            --border-subtle: #1f2937;
        }
        * { box-sizing: border-box; }
        body {
            margin: 0;
            font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
            background: radial-gradient(circle at top, #111827 0, #020617 40%, #000 80%);
            color: var(--text-main);
        }
        .page { max-width: 1200px; margin: 32px auto; padding: 0 16px 32px; }
        h1 { font-size: 28px; margin: 0 0 4px; }
        .subtitle { font-size: 14px; color: var(--text-muted); }
        .cards {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
            gap: 16px;
            margin: 24px 0;
        }
        .card {
            background: linear-gradient(135deg, var(--bg-card) 0%, var(--bg-card-alt) 100%);
            border-radius: 14px;
            padding: 16px 18px;
            border: 1px solid var(--border-subtle);
        }
        .card-label { font-size: 13px; color: var(--text-muted); margin-bottom: 4px; }
        .card-value { font-size: 26px; font-weight: 600; }
        .card-value.on { color: var(--accent); }
        .card-value.off { color: var(--accent-red); }
        .card-value.warn { color: var(--accent-yellow); }
        .table-wrapper {
            margin-top: 24px;
            background: rgba(15,23,42,0.9);
            border-radius: 14px;
            border: 1px solid var(--border-subtle);
            overflow: hidden;
        }
        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 10px 14px; text-align: left; font-size: 13px; }
        th { font-weight: 500; color: var(--text-muted); border-bottom: 1px solid #1f2937; }
        tbody tr:nth-child(even) { background: rgba(15,23,42,0.85); }
        tbody tr:nth-child(odd) { background: rgba(15,23,42,0.7); }
        tbody td:nth-child(3) { color: var(--accent); }
        tbody td:nth-child(4) { color: var(--accent-red); }
        .footer { margin-top: 16px; font-size: 12px; color: var(--text-muted); }
"#;

fn card(out: &mut String, label: &str, class: &str, value: usize) {
    let _ = write!(
        out,
        r#"
            <div class="card">
                <div class="card-label">{label}</div>
                <div class="card-value {class}">{value}</div>
            </div>"#
    );
}

pub fn render(summary: &Summary) -> String {
    let mut cards = String::new();
    card(&mut cards, "History records", "warn", summary.total_records);
    card(&mut cards, "Items ON (last run)", "on", summary.active_count);
    card(&mut cards, "Items OFF (last run)", "off", summary.off_count);
    card(&mut cards, "Items that ever disappeared", "warn", summary.ever_disappeared_count);

    let mut rows = String::new();
    for (section, counts) in summary.sections() {
        let _ = write!(
            rows,
            r#"
                    <tr>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                    </tr>"#,
            html_escape::encode_text(section),
            counts.total,
            counts.on,
            counts.off,
            counts.disappeared,
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8" />
    <title>Menu Item Monitor</title>
    <style>{STYLE}    </style>
</head>
<body>
    <div class="page">
        <header>
            <h1>Menu Item Monitor</h1>
            <div class="subtitle">Last update: {as_of}</div>
        </header>

        <section class="cards">{cards}
        </section>

        <section class="table-wrapper">
            <table>
                <thead>
                    <tr>
                        <th>Section</th>
                        <th>Records (last run)</th>
                        <th>ON</th>
                        <th>OFF</th>
                        <th>Ever disappeared</th>
                    </tr>
                </thead>
                <tbody>{rows}
                </tbody>
            </table>
        </section>

        <div class="footer">
            Generated by <code>menuwatch --mode monitor</code>.
        </div>
    </div>
</body>
</html>
"#,
        as_of = html_escape::encode_text(&summary.as_of),
    )
}

pub fn write(path: &Path, summary: &Summary) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }
    std::fs::write(path, render(summary)).map_err(|e| PersistenceError::io(path, e))
}
