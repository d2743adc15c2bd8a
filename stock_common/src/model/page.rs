use serde::{Deserialize, Serialize};

/// Client-side paging controls forwarded to the server as query parameters.
///
/// No bounds are enforced: the index may go negative or past the last page.
/// Pagination itself is the server's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParameters {
    pub page_size: i64,
    pub page_index: i64,
}

impl PageParameters {
    pub fn new(page_size: i64, page_index: i64) -> Self {
        Self { page_size, page_index }
    }

    /// The parameters selected by the "next" control.
    pub fn next(self) -> Self {
        Self {
            page_index: self.page_index.saturating_add(1),
            ..self
        }
    }

    /// The parameters selected by the "previous" control.
    pub fn previous(self) -> Self {
        Self {
            page_index: self.page_index.saturating_sub(1),
            ..self
        }
    }
}
