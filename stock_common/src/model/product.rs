use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StockError;

/// A single inventory item with its stock levels.
///
/// Records carry no identity; the renderer matches them to rows purely by
/// position in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub current_stock: i64,
    pub max_stock: i64,
}

impl ProductRecord {
    pub fn new(name: impl Into<String>, current_stock: i64, max_stock: i64) -> Self {
        Self {
            name: name.into(),
            current_stock,
            max_stock,
        }
    }

    /// The three cell texts of this record's table row, in column order.
    pub fn cells(&self) -> [String; 3] {
        [
            self.name.clone(),
            self.current_stock.to_string(),
            self.max_stock.to_string(),
        ]
    }
}

/// An ordered sequence of products as delivered by one fetch or push.
///
/// Serializes as a bare JSON array, which is also the v1 HTTP response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductList(Vec<ProductRecord>);

impl ProductList {
    pub fn new(records: Vec<ProductRecord>) -> Self {
        Self(records)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProductRecord> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<ProductRecord> {
        self.0
    }

    /// Decodes a v1 HTTP response body (a bare array of records).
    pub fn from_response_body(body: &[u8]) -> Result<Self, StockError> {
        serde_json::from_slice(body).map_err(|e| {
            StockError::DecodeFailure(format!("expected a JSON array of products: {e}"))
        })
    }
}

impl From<Vec<ProductRecord>> for ProductList {
    fn from(records: Vec<ProductRecord>) -> Self {
        Self(records)
    }
}

impl FromIterator<ProductRecord> for ProductList {
    fn from_iter<I: IntoIterator<Item = ProductRecord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ProductList {
    type Item = &'a ProductRecord;
    type IntoIter = std::slice::Iter<'a, ProductRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Body of a push-channel text frame: `{ "list": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushFrame {
    pub list: ProductList,
}

impl PushFrame {
    pub fn decode(text: &str) -> Result<Self, StockError> {
        serde_json::from_str(text).map_err(|e| {
            StockError::DecodeFailure(format!("expected a push frame with a `list` field: {e}"))
        })
    }
}

/// Reads `name,current_stock,max_stock` rows from a CSV file with a header.
pub fn read_products_csv(path: impl AsRef<Path>) -> Result<ProductList, StockError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| match e.into_kind() {
        csv::ErrorKind::Io(io) => StockError::Io(io),
        other => StockError::DecodeFailure(format!("{other:?}")),
    })?;

    let mut records = Vec::new();
    for row in reader.deserialize::<ProductRecord>() {
        records.push(row?);
    }
    log::debug!("Read {} products from {}", records.len(), path.display());
    Ok(ProductList(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn product_new_sets_fields() {
        let product = ProductRecord::new("Cheese", 10, 20);
        assert_eq!(product.name, "Cheese");
        assert_eq!(product.current_stock, 10);
        assert_eq!(product.max_stock, 20);
    }

    #[test]
    fn response_body_is_a_bare_array() {
        let body = br#"[{"name":"Widget","current_stock":5,"max_stock":20}]"#;
        let list = ProductList::from_response_body(body).unwrap();
        assert_eq!(list, ProductList::new(vec![ProductRecord::new("Widget", 5, 20)]));
    }

    #[test]
    fn response_body_rejects_the_list_envelope() {
        let body = br#"{"list":[{"name":"Widget","current_stock":5,"max_stock":20}]}"#;
        let err = ProductList::from_response_body(body).unwrap_err();
        assert!(matches!(err, StockError::DecodeFailure(_)));
    }

    #[test]
    fn response_body_rejects_non_json() {
        let err = ProductList::from_response_body(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, StockError::DecodeFailure(_)));
    }

    #[test]
    fn push_frame_keeps_server_order() {
        let frame = PushFrame::decode(
            r#"{"list":[
                {"name":"B","current_stock":1,"max_stock":2},
                {"name":"A","current_stock":3,"max_stock":4}
            ]}"#,
        )
        .unwrap();
        let names: Vec<_> = frame.list.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
    }

    #[test]
    fn push_frame_requires_list_field() {
        let err = PushFrame::decode(r#"[{"name":"A","current_stock":3,"max_stock":4}]"#).unwrap_err();
        assert!(matches!(err, StockError::DecodeFailure(_)));
    }

    #[test]
    fn cells_render_numbers_as_text() {
        assert_eq!(ProductRecord::new("Widget", 5, 20).cells(), ["Widget", "5", "20"]);
    }

    #[test]
    fn csv_import_reads_rows_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,current_stock,max_stock").unwrap();
        writeln!(file, "Cheese,10,20").unwrap();
        writeln!(file, "Bread,0,15").unwrap();

        let list = read_products_csv(file.path()).unwrap();
        assert_eq!(
            list.into_inner(),
            vec![ProductRecord::new("Cheese", 10, 20), ProductRecord::new("Bread", 0, 15)]
        );
    }

    #[test]
    fn csv_import_reports_bad_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,current_stock,max_stock").unwrap();
        writeln!(file, "Cheese,lots,20").unwrap();

        let err = read_products_csv(file.path()).unwrap_err();
        assert!(matches!(err, StockError::DecodeFailure(_)));
    }

    #[test]
    fn csv_import_missing_file_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_products_csv(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, StockError::Io(_)));
    }
}
