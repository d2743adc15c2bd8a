//! # Rendering
//!
//! - **`document`**: the in-memory page the client renders into.
//! - **`renderer`**: `TableRenderer`, the full-rebuild table writer, plus
//!   the `RenderTarget` seam.
//! - **`controls`**: the paging inputs and previous/next actions.
//! - **`terminal`**: text output of the rendered table.

pub mod controls;
pub mod document;
pub mod renderer;
pub mod terminal;

pub use document::{Document, Element};
pub use renderer::{RenderTarget, TableBody, TableRenderer, STATUS_ID, TABLE_BODY_SELECTOR};
pub use terminal::format_table;
