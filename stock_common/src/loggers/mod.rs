/// Console + file logger setup built on `fern`.
pub mod logger;

pub use logger::{cleanup_old_logs, parse_level, setup_logging};
