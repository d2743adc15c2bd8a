//! # Product Fetcher
//!
//! Reads one page of products from `GET /api/v1/products`.

use std::future::Future;

use reqwest::Url;

use crate::error::StockError;
use crate::model::{PageParameters, ProductList, ProductSource};
use crate::retrieve::http_client::ApiClient;

/// Path of the product listing, relative to the API base URL.
///
/// The `v1` segment pins the response shape: a bare JSON array of records.
pub const PRODUCTS_PATH: &str = "api/v1/products";

/// Fetches product lists over HTTP.
#[derive(Debug, Clone)]
pub struct ProductFetcher {
    client: ApiClient,
}

impl ProductFetcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The URL a fetch with `params` would target.
    pub fn request_url(&self, params: Option<PageParameters>) -> Result<Url, StockError> {
        let request = self.client.build_get(PRODUCTS_PATH, params.as_ref())?;
        Ok(request.url().clone())
    }

    /// Issues a single request and decodes the product list.
    ///
    /// Transport failures, non-2xx statuses and malformed bodies are all
    /// returned to the caller; nothing is retried.
    pub async fn fetch(&self, params: Option<PageParameters>) -> Result<ProductList, StockError> {
        let response = self.client.get(PRODUCTS_PATH, params.as_ref()).await?;
        let body = response.into_body()?;
        let list = ProductList::from_response_body(&body)?;
        log::info!("Fetched {} products ({:?})", list.len(), params);
        Ok(list)
    }
}

impl ProductSource for ProductFetcher {
    fn fetch_products(
        &self,
        params: Option<PageParameters>,
    ) -> impl Future<Output = Result<ProductList, StockError>> + Send {
        self.fetch(params)
    }
}
