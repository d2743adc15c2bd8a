//! # Page Controls
//!
//! The `page_size` and `page_index` inputs of the product page. Each
//! operation writes the new value back into the input and returns the
//! parameters the next fetch should use.

use crate::error::StockError;
use crate::model::PageParameters;
use crate::render::document::Document;

pub const PAGE_SIZE_ID: &str = "page_size";
pub const PAGE_INDEX_ID: &str = "page_index";

/// Reads the current parameters.
///
/// Returns `Ok(None)` when the page has neither input, which selects an
/// unparameterized fetch.
pub fn read(doc: &Document) -> Result<Option<PageParameters>, StockError> {
    let size = doc.element_by_id(PAGE_SIZE_ID);
    let index = doc.element_by_id(PAGE_INDEX_ID);
    match (size, index) {
        (None, None) => Ok(None),
        (Some(size), Some(index)) => Ok(Some(PageParameters::new(
            parse_input(PAGE_SIZE_ID, size.value())?,
            parse_input(PAGE_INDEX_ID, index.value())?,
        ))),
        (None, Some(_)) => Err(missing(PAGE_SIZE_ID)),
        (Some(_), None) => Err(missing(PAGE_INDEX_ID)),
    }
}

/// Writes both inputs.
pub fn write(doc: &mut Document, params: PageParameters) -> Result<(), StockError> {
    set_input(doc, PAGE_SIZE_ID, params.page_size)?;
    set_input(doc, PAGE_INDEX_ID, params.page_index)
}

pub fn set_page_size(doc: &mut Document, page_size: i64) -> Result<PageParameters, StockError> {
    let params = require(doc)?;
    set_input(doc, PAGE_SIZE_ID, page_size)?;
    Ok(PageParameters { page_size, ..params })
}

pub fn set_page_index(doc: &mut Document, page_index: i64) -> Result<PageParameters, StockError> {
    let params = require(doc)?;
    set_input(doc, PAGE_INDEX_ID, page_index)?;
    Ok(PageParameters { page_index, ..params })
}

/// The "next" button: `page_index + 1`.
pub fn next(doc: &mut Document) -> Result<PageParameters, StockError> {
    let params = require(doc)?.next();
    write(doc, params)?;
    Ok(params)
}

/// The "previous" button: `page_index - 1`.
pub fn previous(doc: &mut Document) -> Result<PageParameters, StockError> {
    let params = require(doc)?.previous();
    write(doc, params)?;
    Ok(params)
}

fn require(doc: &Document) -> Result<PageParameters, StockError> {
    read(doc)?.ok_or_else(|| missing(PAGE_INDEX_ID))
}

fn missing(id: &str) -> StockError {
    StockError::ElementNotFound {
        what: "page control",
        selector: format!("#{id}"),
    }
}

fn parse_input(field: &'static str, value: Option<&str>) -> Result<i64, StockError> {
    let raw = value.unwrap_or_default();
    raw.trim().parse().map_err(|_| StockError::InvalidInput {
        field,
        value: raw.to_string(),
    })
}

fn set_input(doc: &mut Document, id: &str, value: i64) -> Result<(), StockError> {
    doc.element_by_id_mut(id)
        .map(|el| el.set_value(value.to_string()))
        .ok_or_else(|| missing(id))
}
