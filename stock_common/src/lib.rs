//! # stock_common
//!
//! Shared library behind the `stock-table` client. It fetches product stock
//! records from an HTTP endpoint, renders them into a document table and can
//! keep that table current from a WebSocket push channel.
//!
//! Modules other than the data model and the error type are gated behind
//! cargo features so that consumers only pull the dependencies they need.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Typed error kinds shared by every module.
pub mod error;
/// Product records, lists, page parameters and wire envelopes.
pub mod model;

/// Configuration merging from defaults, config file, env and CLI.
#[cfg(feature = "configs")]
pub mod configs;
/// Glue between a product source, the renderer and the document.
#[cfg(feature = "render")]
pub mod controller;
/// The live-update push channel.
#[cfg(feature = "ingestors")]
pub mod ingestors;
/// File and console logger setup.
#[cfg(feature = "loggers")]
pub mod loggers;
/// In-memory document, table renderer and page controls.
#[cfg(feature = "render")]
pub mod render;
/// HTTP client and product fetcher.
#[cfg(feature = "retrieve")]
pub mod retrieve;

pub use error::StockError;
pub use model::{PageParameters, ProductList, ProductRecord, ProductSource};
