//! Discrepancy digest formatting using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use rbacheck::Discrepancy;

/// Creates the end-of-run table: one row per discrepancy, in run order.
pub fn discrepancy_table(discrepancies: &[Discrepancy]) -> Table {
    let mut table = Table::new();

    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = ["#", "Expected", "Actual", "Command"]
        .into_iter()
        .map(|col| {
            if super::no_color() {
                Cell::new(col)
            } else {
                Cell::new(col).add_attribute(Attribute::Bold).fg(Color::Cyan)
            }
        })
        .collect();
    table.set_header(header_cells);

    for (i, discrepancy) in discrepancies.iter().enumerate() {
        let actual = if discrepancy.actual.is_empty() {
            "(no answer)"
        } else {
            discrepancy.actual.as_str()
        };
        let actual_cell = if super::no_color() {
            Cell::new(actual)
        } else {
            Cell::new(actual).fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(discrepancy.probe.expected()),
            actual_cell,
            Cell::new(discrepancy.probe.command()),
        ]);
    }

    table
}

/// Prints the discrepancy digest table.
pub fn print_discrepancy_table(discrepancies: &[Discrepancy]) {
    println!("{}", discrepancy_table(discrepancies));
}
