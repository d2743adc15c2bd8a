//! # Error Kinds
//!
//! Every fallible operation in the crate returns [`StockError`]. Callers
//! decide how a failure becomes visible; the controller turns it into a
//! status banner and the CLI logs it.

use thiserror::Error;

/// Errors that can occur while fetching, decoding or rendering products.
#[derive(Debug, Error)]
pub enum StockError {
    /// A required document element is missing. Rendering performs no
    /// mutation when this is returned.
    #[error("cannot find {what} (`{selector}`)")]
    ElementNotFound {
        /// Human name of the missing element, e.g. "table".
        what: &'static str,
        /// The selector or id that failed to match.
        selector: String,
    },

    /// The push channel cannot be opened with the given endpoint.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),

    /// A response body or push frame does not have the expected shape.
    #[error("decode failure: {0}")]
    DecodeFailure(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {status}{}", .body.as_deref().map(|b| format!(": {b}")).unwrap_or_default())]
    HttpStatus {
        /// The numeric HTTP status code.
        status: u16,
        /// The raw error body, if one could be read.
        body: Option<String>,
    },

    /// A page control holds a value that is not an integer.
    #[error("invalid input for `{field}`: {value:?}")]
    InvalidInput {
        /// Id of the offending input.
        field: &'static str,
        /// The raw value found in the input.
        value: String,
    },

    /// Configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),

    /// Reading or writing a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StockError {
    /// Shorthand for the renderer's missing-table fault.
    pub fn table_not_found(selector: &str) -> Self {
        StockError::ElementNotFound {
            what: "table",
            selector: selector.to_string(),
        }
    }
}

impl From<csv::Error> for StockError {
    fn from(e: csv::Error) -> Self {
        StockError::DecodeFailure(e.to_string())
    }
}

#[cfg(any(feature = "retrieve", feature = "ingestors"))]
impl From<url::ParseError> for StockError {
    fn from(e: url::ParseError) -> Self {
        StockError::Config(format!("invalid URL: {e}"))
    }
}
