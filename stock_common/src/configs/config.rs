use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::StockError;
use crate::model::PageParameters;

/// Default config file name, looked up in the working directory and then in
/// the user config directory.
pub const CONFIG_FILE_NAME: &str = "stock_table.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(name = "stock-table", about = "Product stock table client", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "STOCK_API_URL", help = "Base URL of the product API.")]
    pub api_base_url: Option<String>,

    #[clap(long, env = "STOCK_WS_URL", help = "WebSocket URL of the live-update channel.")]
    pub ws_url: Option<String>,

    #[clap(long, env = "STOCK_PAGE_SIZE", allow_negative_numbers = true, help = "Initial page size.")]
    pub page_size: Option<i64>,

    #[clap(long, env = "STOCK_PAGE_INDEX", allow_negative_numbers = true, help = "Initial page index.")]
    pub page_index: Option<i64>,

    #[clap(long, env = "STOCK_PAGED", num_args = 0..=1, default_missing_value = "true", help = "Send page_size/page_index with every fetch.")]
    pub paged: Option<bool>,

    #[clap(long, env = "STOCK_LIVE", num_args = 0..=1, default_missing_value = "true", help = "Keep the table current from the live-update channel.")]
    pub live: Option<bool>,

    #[clap(long, env = "STOCK_INTERACTIVE", num_args = 0..=1, default_missing_value = "true", help = "Read paging commands from stdin.")]
    pub interactive: Option<bool>,

    #[clap(long, env = "STOCK_CSV", help = "Render products from a CSV file instead of the API.")]
    pub csv: Option<PathBuf>,

    #[clap(long, env = "STOCK_HTML_OUT", help = "Write the rendered page to this HTML file after every render.")]
    pub html_out: Option<PathBuf>,

    #[clap(long, env = "STOCK_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "STOCK_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "STOCK_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "STOCK_REQUEST_TIMEOUT_SECONDS", help = "HTTP request timeout in seconds.")]
    pub request_timeout_seconds: Option<u64>,

    #[clap(long, env = "STOCK_RECONNECT_BASE_DELAY_MS", help = "Base delay in milliseconds for live-channel reconnects.")]
    pub reconnect_base_delay_ms: Option<u64>,

    #[clap(long, env = "STOCK_RECONNECT_MAX_DELAY_MS", help = "Maximum delay in milliseconds for live-channel reconnects.")]
    pub reconnect_max_delay_ms: Option<u64>,

    #[clap(long, env = "STOCK_MAX_RECONNECT_ATTEMPTS", help = "Give up after this many failed reconnects (default: never).")]
    pub max_reconnect_attempts: Option<u32>,
}

impl Config {
    /// Built-in defaults, the lowest-precedence layer.
    pub fn defaults() -> Config {
        Config {
            api_base_url: Some("http://127.0.0.1:8080/".to_string()),
            ws_url: Some("ws://127.0.0.1:8080/ws".to_string()),
            page_size: Some(10),
            page_index: Some(0),
            paged: Some(true),
            live: Some(false),
            interactive: Some(false),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            request_timeout_seconds: Some(10),
            reconnect_base_delay_ms: Some(1000),
            reconnect_max_delay_ms: Some(60000),
            ..Default::default()
        }
    }

    // Merge two Config structs, where 'other' overrides 'self' for Some values
    pub fn merge(self, other: Config) -> Config {
        Config {
            api_base_url: other.api_base_url.or(self.api_base_url),
            ws_url: other.ws_url.or(self.ws_url),
            page_size: other.page_size.or(self.page_size),
            page_index: other.page_index.or(self.page_index),
            paged: other.paged.or(self.paged),
            live: other.live.or(self.live),
            interactive: other.interactive.or(self.interactive),
            csv: other.csv.or(self.csv),
            html_out: other.html_out.or(self.html_out),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            request_timeout_seconds: other.request_timeout_seconds.or(self.request_timeout_seconds),
            reconnect_base_delay_ms: other.reconnect_base_delay_ms.or(self.reconnect_base_delay_ms),
            reconnect_max_delay_ms: other.reconnect_max_delay_ms.or(self.reconnect_max_delay_ms),
            max_reconnect_attempts: other.max_reconnect_attempts.or(self.max_reconnect_attempts),
        }
    }

    /// Reads a JSON config file.
    pub fn from_file(path: &Path) -> Result<Config, StockError> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| StockError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// The initial page parameters, when paging is enabled.
    pub fn page_parameters(&self) -> Option<PageParameters> {
        if !self.paged.unwrap_or(true) {
            return None;
        }
        Some(PageParameters::new(self.page_size.unwrap_or(10), self.page_index.unwrap_or(0)))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

/// Candidate config file locations, in lookup order.
fn config_file_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }
    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("stock-table").join(CONFIG_FILE_NAME));
    }
    candidates
}

/// Layers defaults, the config file and `cli` (which already includes
/// environment variables) in increasing precedence.
///
/// An explicitly given config file must exist and parse; the default
/// locations are skipped when absent.
pub fn resolve_config(cli: Config) -> Result<Config, StockError> {
    let mut current_config = Config::defaults();

    let explicit = cli.config_path.as_deref();
    let found = config_file_candidates(explicit).into_iter().find(|p| p.exists());

    match (found, explicit) {
        (Some(path), _) => {
            let file_config = Config::from_file(&path)?;
            log::info!("Loaded config file {}", path.display());
            current_config = current_config.merge(file_config);
        }
        (None, Some(path)) => {
            return Err(StockError::Config(format!("config file {} not found", path.display())));
        }
        (None, None) => {
            log::info!("No config file found. Using defaults and environment/CLI variables.");
        }
    }

    Ok(current_config.merge(cli))
}

/// Parses the process arguments and resolves the full configuration.
pub fn load_config() -> Result<Config, StockError> {
    resolve_config(Config::parse())
}
