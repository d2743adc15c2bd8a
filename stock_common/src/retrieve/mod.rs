//! # Data Retrieval Module
//!
//! HTTP-side plumbing for the client.
//!
//! - **`http_client`**: `ApiClient`, a `reqwest` wrapper bound to a base URL
//!   with structured query encoding.
//! - **`fetcher`**: `ProductFetcher`, which reads one page of products and
//!   implements [`ProductSource`](crate::model::ProductSource).

/// Base-URL HTTP client with structured query parameters.
pub mod http_client;
/// The product listing fetcher.
pub mod fetcher;

pub use fetcher::{ProductFetcher, PRODUCTS_PATH};
pub use http_client::{ApiClient, ApiResponse};
