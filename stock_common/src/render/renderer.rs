//! # Table Renderer
//!
//! Rebuilds a table body so that it shows exactly one row per product, in
//! list order. Every call is a full rebuild; nothing is diffed.

use crate::error::StockError;
use crate::model::ProductList;
use crate::render::document::{Document, Element};

/// Selector of the product table body.
pub const TABLE_BODY_SELECTOR: &str = "#table tbody";
/// Id of the status banner element.
pub const STATUS_ID: &str = "status";

/// A table body the renderer can rebuild.
pub trait TableBody {
    fn clear_rows(&mut self);
    fn append_row(&mut self, cells: [String; 3]);
}

/// Something that owns a table body and an optional status banner.
///
/// [`Document`] is the standard target; tests and other front ends can
/// provide their own.
pub trait RenderTarget {
    type Body: TableBody;

    /// The table body matching `selector`, if any.
    fn table_body(&mut self, selector: &str) -> Option<&mut Self::Body>;

    /// Replaces the text of the element with `id`. Returns `false` when the
    /// element does not exist.
    fn set_text(&mut self, id: &str, text: &str) -> bool;
}

impl TableBody for Element {
    fn clear_rows(&mut self) {
        self.remove_children();
    }

    fn append_row(&mut self, cells: [String; 3]) {
        let row = cells
            .into_iter()
            .fold(Element::new("tr"), |tr, text| tr.with_child(Element::new("td").with_text(text)));
        self.append_child(row);
    }
}

impl RenderTarget for Document {
    type Body = Element;

    fn table_body(&mut self, selector: &str) -> Option<&mut Element> {
        self.query_selector_mut(selector).ok().flatten()
    }

    fn set_text(&mut self, id: &str, text: &str) -> bool {
        match self.element_by_id_mut(id) {
            Some(el) => {
                el.set_text(text);
                true
            }
            None => false,
        }
    }
}

/// Renders product lists and status messages into a [`RenderTarget`].
#[derive(Debug, Clone)]
pub struct TableRenderer {
    selector: String,
    status_id: String,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new(TABLE_BODY_SELECTOR, STATUS_ID)
    }
}

impl TableRenderer {
    pub fn new(selector: impl Into<String>, status_id: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            status_id: status_id.into(),
        }
    }

    /// Replaces the table body contents with `products`.
    ///
    /// Fails with `ElementNotFound` before touching anything when the table
    /// body is missing. Returns the number of rows written.
    pub fn render<T: RenderTarget>(&self, target: &mut T, products: &ProductList) -> Result<usize, StockError> {
        let body = target
            .table_body(&self.selector)
            .ok_or_else(|| StockError::table_not_found(&self.selector))?;

        body.clear_rows();
        for product in products {
            body.append_row(product.cells());
        }
        log::debug!("Rendered {} rows into `{}`", products.len(), self.selector);
        Ok(products.len())
    }

    /// Writes `message` into the status banner. Returns `false` when the
    /// target has no banner.
    pub fn show_status<T: RenderTarget>(&self, target: &mut T, message: &str) -> bool {
        target.set_text(&self.status_id, message)
    }

    /// Shows `error` in the status banner.
    pub fn show_error<T: RenderTarget>(&self, target: &mut T, error: &StockError) -> bool {
        self.show_status(target, &format!("Error: {error}"))
    }

    pub fn clear_status<T: RenderTarget>(&self, target: &mut T) -> bool {
        self.show_status(target, "")
    }
}
