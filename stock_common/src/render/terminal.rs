//! Plain-text rendering of the product table for the terminal.

use colored::Colorize;
use comfy_table::{presets, CellAlignment, Table};

use crate::render::document::Document;

const HEADERS: [&str; 3] = ["Name", "Current stock", "Max stock"];

/// Formats the rows under `selector` as an aligned text table.
///
/// Returns `None` when the table body is missing.
pub fn format_table(doc: &Document, selector: &str) -> Option<String> {
    let rows = doc.table_rows(selector)?;

    let mut table = Table::new();
    table.load_preset(presets::ASCII_MARKDOWN).set_header(HEADERS);
    for row in &rows {
        table.add_row(row);
    }
    // Stock columns are numeric.
    for index in 1..HEADERS.len() {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    let mut out = format!("{table}\n");
    if rows.is_empty() {
        out.push_str(&format!("{}\n", "(no products)".dimmed()));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProductList, ProductRecord};
    use crate::render::renderer::{TableRenderer, TABLE_BODY_SELECTOR};

    fn line_with<'a>(text: &'a str, needle: &str) -> &'a str {
        text.lines().find(|l| l.contains(needle)).unwrap()
    }

    #[test]
    fn columns_are_aligned() {
        let mut doc = Document::product_page(10, 0);
        let products: ProductList = vec![
            ProductRecord::new("Widget", 5, 20),
            ProductRecord::new("Extra long gadget", 120, 3000),
        ]
        .into();
        TableRenderer::default().render(&mut doc, &products).unwrap();

        let text = format_table(&doc, TABLE_BODY_SELECTOR).unwrap();

        let header = line_with(&text, "Name");
        assert!(header.contains("Current stock") && header.contains("Max stock"));

        let widget = line_with(&text, "Widget");
        assert!(widget.contains("| Widget "), "name is left-aligned: {widget:?}");
        assert!(widget.contains("  5 |"), "stock is right-aligned: {widget:?}");
        assert!(widget.contains(" 20 |"), "max is right-aligned: {widget:?}");

        let gadget = line_with(&text, "Extra long gadget");
        assert_eq!(gadget.len(), widget.len());
        assert!(gadget.contains(" 3000 |"));

        let rows_before = text.find("Widget").unwrap();
        assert!(rows_before < text.find("Extra long gadget").unwrap());
    }

    #[test]
    fn empty_table_says_so() {
        colored::control::set_override(false);
        let doc = Document::product_page(10, 0);
        let text = format_table(&doc, TABLE_BODY_SELECTOR).unwrap();
        assert!(text.contains("Name"));
        assert!(text.ends_with("(no products)\n"));
    }

    #[test]
    fn missing_table_is_none() {
        let doc = Document::new(crate::render::document::Element::new("html"));
        assert!(format_table(&doc, TABLE_BODY_SELECTOR).is_none());
    }
}
