//! # Data Model
//!
//! Plain data carried between the fetcher, the push channel and the
//! renderer. Nothing here performs I/O except the CSV import.

/// Paging parameters forwarded to the server.
pub mod page;
/// Product records, lists and the wire envelopes that carry them.
pub mod product;
/// The `ProductSource` seam used by the controller.
pub mod source;

pub use page::PageParameters;
pub use product::{read_products_csv, PushFrame, ProductList, ProductRecord};
pub use source::ProductSource;
