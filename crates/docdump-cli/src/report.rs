//! End-of-run console report

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use docdump_export::ExportReport;

/// Render the report printed to stdout after a successful run
pub fn render(report: &ExportReport) -> String {
    let mut out = String::new();

    if report.tables.is_empty() {
        out.push_str("No tables exported.\n");
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Table", "Rows"]);
        for summary in &report.tables {
            table.add_row(vec![
                Cell::new(&summary.name),
                Cell::new(summary.rows).set_alignment(CellAlignment::Right),
            ]);
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }

    if !report.skipped.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Skipped table", "Kind", "Reason"]);
        for skipped in &report.skipped {
            table.add_row(vec![
                Cell::new(&skipped.name),
                Cell::new(skipped.kind),
                Cell::new(&skipped.reason),
            ]);
        }
        out.push('\n');
        out.push_str(&table.to_string());
        out.push('\n');
    }

    out.push_str(&format!(
        "\nExported {} rows from {} tables",
        report.total_rows(),
        report.tables.len()
    ));
    if !report.skipped.is_empty() {
        out.push_str(&format!(", skipped {}", report.skipped.len()));
    }
    out.push('\n');
    out.push_str(&format!("Output: {}\n", report.output_path.display()));
    out
}
