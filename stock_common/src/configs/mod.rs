//! # Configuration
//!
//! Settings are layered from built-in defaults, an optional JSON config
//! file, environment variables and command-line flags, in increasing
//! precedence.

/// The layered `Config` struct and its loaders.
pub mod config;

pub use config::{load_config, resolve_config, Config, CONFIG_FILE_NAME};
