use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

use crate::export::Sheet;

/// Terminal rendering of one sheet.
pub fn render_table(sheet: &Sheet) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            sheet
                .headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );

    for row in &sheet.rows {
        table.add_row(row.iter().map(Cell::new));
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headers_and_cells() {
        let sheet = Sheet {
            name: "pains",
            headers: vec!["#", "pains"],
            rows: vec![vec!["1".into(), "manual rework".into()]],
        };
        let out = render_table(&sheet);
        assert!(out.contains("pains"));
        assert!(out.contains("manual rework"));
    }
}
