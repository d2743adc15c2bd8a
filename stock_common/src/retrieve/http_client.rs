//! # HTTP Client
//!
//! A thin asynchronous wrapper around `reqwest` that joins relative paths
//! onto a base URL, encodes query parameters from any `Serialize` value and
//! reports non-2xx responses without treating them as transport errors.
//!
//! There are no retries: one call issues exactly one request.

use std::time::Duration;

use reqwest::{header::HeaderMap, Method, Request, StatusCode, Url};
use serde::Serialize;

use crate::error::StockError;

/// The outcome of one HTTP exchange.
///
/// The body is kept raw so callers choose how to decode it.
#[derive(Debug)]
pub struct ApiResponse {
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
    /// The headers returned by the server.
    pub headers: HeaderMap,
    /// The raw response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Returns the body of a successful response, or `HttpStatus` carrying
    /// the error body as text.
    pub fn into_body(self) -> Result<Vec<u8>, StockError> {
        if self.success {
            Ok(self.body)
        } else {
            let text = String::from_utf8_lossy(&self.body).trim().to_string();
            Err(StockError::HttpStatus {
                status: self.status,
                body: (!text.is_empty()).then_some(text),
            })
        }
    }
}

/// An HTTP client bound to one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Creates a client for `base_url`.
    ///
    /// The base URL must be absolute. A trailing slash is added when
    /// missing so that relative paths join beneath it.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, StockError> {
        let mut url = Url::parse(base_url)?;
        if url.cannot_be_a_base() {
            return Err(StockError::Config(format!("`{base_url}` cannot be used as a base URL")));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder().user_agent(concat!(
            "stock-table/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder
            .build()
            .map_err(|e| StockError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { inner, base_url: url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds a GET request without sending it.
    ///
    /// `query` is encoded as structured key/value pairs; `None` leaves the
    /// URL without a query string.
    pub fn build_get<Q>(&self, path: &str, query: Option<&Q>) -> Result<Request, StockError>
    where
        Q: Serialize + ?Sized,
    {
        let full_url = self.base_url.join(path.trim_start_matches('/'))?;
        let mut req = self.inner.request(Method::GET, full_url);
        if let Some(q) = query {
            req = req.query(q);
        }
        req.build()
            .map_err(|e| StockError::Config(format!("cannot build request for `{path}`: {e}")))
    }

    /// Sends a GET request and captures the status, headers and body.
    pub async fn get<Q>(&self, path: &str, query: Option<&Q>) -> Result<ApiResponse, StockError>
    where
        Q: Serialize + ?Sized,
    {
        let request = self.build_get(path, query)?;
        log::debug!("GET {}", request.url());

        let response = self
            .inner
            .execute(request)
            .await
            .map_err(|e| StockError::Network(e.to_string()))?;
        let status: StatusCode = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| StockError::Network(e.to_string()))?
            .to_vec();

        if !status.is_success() {
            log::warn!("GET {path} answered {status}");
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            success: status.is_success(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageParameters;

    #[test]
    fn base_url_gets_a_trailing_slash() {
        let client = ApiClient::new("http://127.0.0.1:8080/api", None).unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8080/api/");
    }

    #[test]
    fn relative_base_url_is_a_config_error() {
        let err = ApiClient::new("api/v1", None).unwrap_err();
        assert!(matches!(err, StockError::Config(_)));
    }

    #[test]
    fn query_is_structured() {
        let client = ApiClient::new("http://127.0.0.1:8080/", None).unwrap();
        let req = client
            .build_get("/api/v1/products", Some(&PageParameters::new(10, 2)))
            .unwrap();
        assert_eq!(
            req.url().as_str(),
            "http://127.0.0.1:8080/api/v1/products?page_size=10&page_index=2"
        );
    }

    #[test]
    fn failed_response_surfaces_status_and_body() {
        let response = ApiResponse {
            status: 500,
            success: false,
            headers: HeaderMap::new(),
            body: b"boom\n".to_vec(),
        };
        match response.into_body() {
            Err(StockError::HttpStatus { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body.as_deref(), Some("boom"));
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }
}
