use std::future::Future;

use crate::error::StockError;
use crate::model::{PageParameters, ProductList};

/// Anything that can produce a product list for a page.
///
/// The HTTP fetcher is the production implementation; tests substitute an
/// in-memory source.
pub trait ProductSource {
    fn fetch_products(
        &self,
        params: Option<PageParameters>,
    ) -> impl Future<Output = Result<ProductList, StockError>> + Send;
}
