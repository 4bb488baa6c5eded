//! Plain-text batch report, compact label and CSV export

use std::io::Write;

use anyhow::Result;
use chrono::Local;

use crate::models::{BatchDetail, BatchRecord};

/// Full multi-section report for a finalized batch
pub fn format_report(record: &BatchRecord) -> String {
    let mut output = String::new();
    let detail = record.detail();

    output.push_str(&format!("Production Report - Batch {}\n", record.id));
    output.push_str(&format!("Date: {}\n", record.created_on));
    output.push_str(&format!("Operator: {}\n", record.operator));
    output.push_str(&format!("Beverage: {}\n\n", or_dash(&record.beverage)));

    output.push_str("Extraction\n");
    if let Some(detail) = &detail {
        output.push_str(&format_rounds(detail));
    }
    output.push_str(&format!(
        "  Total extracted: {:.1} L\n\n",
        record.extraction_total
    ));

    output.push_str("Transfers\n");
    if let Some(detail) = &detail {
        for entry in &detail.transfers {
            output.push_str(&format!(
                "  {} -> {}: {:.1} L\n",
                entry.recorded_at.with_timezone(&Local).format("%H:%M:%S"),
                entry.target,
                entry.quantity
            ));
        }
    }
    output.push_str(&format!(
        "  Total transferred: {:.1} L\n\n",
        record.transfer_total
    ));

    output.push_str("Result\n");
    output.push_str(&format!("  Final volume: {:.1} L\n", record.final_volume));
    output.push_str(&format!("  Yield: {:.1}%\n", record.percentage));
    output.push_str(&format!("  Status: {}\n", record.status.describe()));

    output
}

fn format_rounds(detail: &BatchDetail) -> String {
    let mut output = String::new();
    for round in &detail.rounds {
        output.push_str(&format!(
            "  Round {} (target {:.0} L): {:.1} L\n",
            round.round, round.target, round.total
        ));
        for (i, volume) in round.readings.iter().enumerate() {
            let name = detail.vessels.get(i).map(String::as_str).unwrap_or("?");
            output.push_str(&format!("    {}: {:.1} L", name, volume));
            if let Some(Some(window)) = round.windows.get(i) {
                output.push_str(&format!(
                    " ({} - {}, {} min)",
                    window.start.format("%H:%M"),
                    window.end.format("%H:%M"),
                    window.duration().num_minutes()
                ));
            }
            output.push('\n');
        }
    }
    output
}

/// Small fixed-size label: id, date, operator and beverage
pub fn format_label(record: &BatchRecord) -> String {
    const WIDTH: usize = 28;
    let border = format!("+{}+\n", "-".repeat(WIDTH));
    let mut output = border.clone();
    for line in [
        format!("BATCH {}", record.id),
        format!("Date: {}", record.created_on),
        format!("Op: {}", record.operator),
        format!("Type: {}", or_dash(&record.beverage)),
    ] {
        let clipped: String = line.chars().take(WIDTH - 2).collect();
        output.push_str(&format!("| {:<width$} |\n", clipped, width = WIDTH - 2));
    }
    output.push_str(&border);
    output
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

const CSV_HEADER: [&str; 10] = [
    "id",
    "created_on",
    "operator",
    "beverage",
    "extraction_total",
    "transfer_total",
    "final_volume",
    "percentage",
    "status",
    "detail",
];

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write every record as CSV, header first
pub fn write_csv<W: Write>(mut out: W, records: &[BatchRecord]) -> Result<()> {
    writeln!(out, "{}", CSV_HEADER.join(","))?;
    for r in records {
        let fields = [
            csv_field(&r.id),
            r.created_on.to_string(),
            csv_field(&r.operator),
            csv_field(&r.beverage),
            r.extraction_total.to_string(),
            r.transfer_total.to_string(),
            r.final_volume.to_string(),
            r.percentage.to_string(),
            r.status.as_str().to_string(),
            csv_field(&r.detail),
        ];
        writeln!(out, "{}", fields.join(","))?;
    }
    out.flush()?;
    Ok(())
}
