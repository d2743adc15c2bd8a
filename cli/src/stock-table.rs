//! # stock-table
//!
//! Fetches the product list once, renders it, and then optionally keeps the
//! table current from the live-update channel and/or stdin paging commands.
//!
//! Every render prints the table to stdout and, with `--html-out`, rewrites
//! the HTML page. Fetch and decode failures are shown in the status banner
//! and logged; they never stop the event loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use stock_common::configs::{load_config, Config};
use stock_common::controller::TableController;
use stock_common::ingestors::{ChannelConfig, ChannelEvent, LiveChannel};
use stock_common::loggers::setup_logging;
use stock_common::model::read_products_csv;
use stock_common::render::{format_table, Document, TableRenderer, STATUS_ID, TABLE_BODY_SELECTOR};
use stock_common::retrieve::{ApiClient, ProductFetcher};
use stock_common::{ProductSource, StockError};

const APP_NAME: &str = "stock-table";

/// A paging command typed on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Next,
    Previous,
    PageSize(i64),
    PageIndex(i64),
    Refresh,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Command, String> {
        let mut parts = line.split_whitespace();
        let word = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments in `{}`", line.trim()));
        }

        let number = |name: &str| -> Result<i64, String> {
            let raw = arg.ok_or_else(|| format!("`{name}` needs a number"))?;
            raw.parse().map_err(|_| format!("`{raw}` is not a number"))
        };

        match word.as_str() {
            "n" | "next" => Ok(Command::Next),
            "p" | "prev" | "previous" => Ok(Command::Previous),
            "size" => number("size").map(Command::PageSize),
            "index" => number("index").map(Command::PageIndex),
            "r" | "refresh" | "" => Ok(Command::Refresh),
            "h" | "help" | "?" => Ok(Command::Help),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command `{other}` (try `help`)")),
        }
    }
}

const HELP: &str = "commands: next | previous | size <n> | index <n> | refresh | quit";

/// Prints the table (and banner) and rewrites the HTML page if configured.
fn publish(doc: &Document, html_out: Option<&Path>) -> Result<()> {
    if let Some(status) = doc.element_by_id(STATUS_ID).map(|el| el.text()).filter(|s| !s.is_empty()) {
        println!("{}", status.bright_red());
    }
    match format_table(doc, TABLE_BODY_SELECTOR) {
        Some(table) => print!("{table}"),
        None => println!("{}", "(no product table on this page)".dimmed()),
    }
    if let Some(path) = html_out {
        std::fs::write(path, doc.to_html()).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

async fn next_command(lines: &mut Option<Lines<BufReader<Stdin>>>) -> Option<Result<Command, String>> {
    match lines {
        Some(reader) => match reader.next_line().await {
            Ok(Some(line)) => Some(Command::parse(&line)),
            Ok(None) => None,
            Err(e) => Some(Err(format!("stdin error: {e}"))),
        },
        None => std::future::pending().await,
    }
}

fn channel_config(config: &Config) -> ChannelConfig {
    let defaults = ChannelConfig::default();
    ChannelConfig {
        ws_url: config.ws_url.clone().unwrap_or(defaults.ws_url),
        reconnect_base_delay: config
            .reconnect_base_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.reconnect_base_delay),
        reconnect_max_delay: config
            .reconnect_max_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.reconnect_max_delay),
        max_reconnect_attempts: config.max_reconnect_attempts,
    }
}

fn render_csv(path: &Path, html_out: Option<&Path>) -> Result<()> {
    let products = read_products_csv(path).with_context(|| format!("reading {}", path.display()))?;
    let mut doc = Document::product_page_without_controls();
    TableRenderer::default().render(&mut doc, &products)?;
    log::info!("Rendered {} products from {}", products.len(), path.display());
    publish(&doc, html_out)
}

/// A running push channel and the receiving end of its events.
struct LiveTask {
    events: mpsc::Receiver<ChannelEvent>,
    task: JoinHandle<Result<(), StockError>>,
}

/// Opens the push channel. An unusable endpoint is reported in the status
/// banner and the session carries on without live updates.
fn start_live<S: ProductSource>(
    config: &Config,
    controller: &mut TableController<S>,
    shutdown: &broadcast::Sender<()>,
) -> Option<LiveTask> {
    match LiveChannel::open(channel_config(config)) {
        Ok(channel) => {
            let (events_tx, events) = mpsc::channel::<ChannelEvent>(32);
            let task = tokio::spawn(channel.run(events_tx, shutdown.subscribe()));
            Some(LiveTask { events, task })
        }
        Err(e) => {
            controller.report(&e);
            None
        }
    }
}

async fn next_event(live: &mut Option<LiveTask>) -> Option<ChannelEvent> {
    match live {
        Some(live) => live.events.recv().await,
        None => std::future::pending().await,
    }
}

/// Renders one push event. Failures are logged and shown by the controller.
fn apply_event<S: ProductSource>(controller: &mut TableController<S>, event: ChannelEvent) {
    match event {
        ChannelEvent::Products(products) => {
            let _ = controller.apply_push(&products);
        }
        ChannelEvent::Rejected(e) => controller.report(&e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = load_config()?;
    let log_dir = config.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"));
    let log_path = setup_logging(&log_dir, config.log_level.as_deref().unwrap_or("info"), APP_NAME)?;
    log::info!("Logging to {}", log_path.display());

    let html_out = config.html_out.as_deref();

    if let Some(csv) = &config.csv {
        return render_csv(csv, html_out);
    }

    let base_url = config.api_base_url.as_deref().unwrap_or("http://127.0.0.1:8080/");
    let fetcher = ProductFetcher::new(ApiClient::new(base_url, config.request_timeout())?);
    let document = match config.page_parameters() {
        Some(params) => Document::product_page(params.page_size, params.page_index),
        None => Document::product_page_without_controls(),
    };
    let mut controller = TableController::new(fetcher, document);

    // The controller logs and shows its own failures.
    let _ = controller.refresh().await;

    let live = config.live.unwrap_or(false);
    let interactive = config.interactive.unwrap_or(false);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let mut live_task = if live {
        start_live(&config, &mut controller, &shutdown_tx)
    } else {
        None
    };
    publish(controller.document(), html_out)?;

    if live_task.is_none() && !interactive {
        return Ok(());
    }
    let mut events_open = live_task.is_some();

    let mut commands = interactive.then(|| BufReader::new(tokio::io::stdin()).lines());
    if interactive {
        println!("{HELP}");
    }

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                log::info!("Ctrl-C received, initiating shutdown.");
                break;
            }
            event = next_event(&mut live_task), if events_open => {
                match event {
                    Some(event) => apply_event(&mut controller, event),
                    None => {
                        events_open = false;
                        if let Some(LiveTask { task, .. }) = live_task.take() {
                            match task.await {
                                Ok(Err(e)) => controller.report(&e),
                                Ok(Ok(())) => {}
                                Err(e) => log::error!("Live channel task failed: {}", e),
                            }
                        }
                        if commands.is_none() {
                            publish(controller.document(), html_out)?;
                            break;
                        }
                    }
                }
                publish(controller.document(), html_out)?;
            }
            command = next_command(&mut commands) => {
                let command = match command {
                    Some(Ok(command)) => command,
                    Some(Err(msg)) => {
                        println!("{}", msg.yellow());
                        continue;
                    }
                    None => {
                        log::info!("stdin closed.");
                        commands = None;
                        if !events_open {
                            break;
                        }
                        continue;
                    }
                };
                // The controller logs and shows its own failures.
                let _ = match command {
                    Command::Next => controller.next_page().await,
                    Command::Previous => controller.previous_page().await,
                    Command::PageSize(size) => controller.set_page_size(size).await,
                    Command::PageIndex(index) => controller.set_page_index(index).await,
                    Command::Refresh => controller.refresh().await,
                    Command::Help => {
                        println!("{HELP}");
                        continue;
                    }
                    Command::Quit => break,
                };
                publish(controller.document(), html_out)?;
            }
        }
    }

    let _ = shutdown_tx.send(());
    if let Some(LiveTask { task, .. }) = live_task {
        match tokio::time::timeout(Duration::from_secs(5), task).await {
            Ok(Ok(Err(e))) => log::warn!("Live channel ended with: {}", e),
            Ok(Err(e)) => log::error!("Live channel task failed: {}", e),
            Err(_) => log::warn!("Live channel did not stop within 5s."),
            Ok(Ok(Ok(()))) => {}
        }
    }

    log::info!("Shutdown complete.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use stock_common::render::Element;
    use stock_common::{ProductList, ProductRecord};

    static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

    struct Capture;

    impl log::Log for Capture {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            CAPTURED.lock().unwrap().push(record.args().to_string());
        }

        fn flush(&self) {}
    }

    fn capture_logs() {
        let _ = log::set_logger(&Capture);
        log::set_max_level(log::LevelFilter::Trace);
    }

    fn logged(needle: &str) -> usize {
        CAPTURED.lock().unwrap().iter().filter(|m| m.contains(needle)).count()
    }

    fn offline_controller(document: Document) -> TableController<ProductFetcher> {
        let client = ApiClient::new("http://127.0.0.1:9/", None).unwrap();
        TableController::new(ProductFetcher::new(client), document)
    }

    fn banner(controller: &TableController<ProductFetcher>) -> String {
        controller.document().element_by_id(STATUS_ID).unwrap().text().to_string()
    }

    #[test]
    fn paging_commands_parse() {
        assert_eq!(Command::parse("next"), Ok(Command::Next));
        assert_eq!(Command::parse(" P "), Ok(Command::Previous));
        assert_eq!(Command::parse("size 25"), Ok(Command::PageSize(25)));
        assert_eq!(Command::parse("index -1"), Ok(Command::PageIndex(-1)));
        assert_eq!(Command::parse(""), Ok(Command::Refresh));
        assert_eq!(Command::parse("quit"), Ok(Command::Quit));
    }

    #[test]
    fn bad_commands_explain_themselves() {
        assert_eq!(Command::parse("size"), Err("`size` needs a number".to_string()));
        assert_eq!(Command::parse("index two"), Err("`two` is not a number".to_string()));
        assert!(Command::parse("jump 3").unwrap_err().contains("unknown command"));
        assert!(Command::parse("size 1 2").unwrap_err().contains("too many"));
    }

    #[test]
    fn channel_config_falls_back_to_defaults() {
        let config = Config {
            ws_url: Some("ws://example.test/ws".into()),
            reconnect_base_delay_ms: Some(250),
            ..Default::default()
        };
        let channel = channel_config(&config);
        assert_eq!(channel.ws_url, "ws://example.test/ws");
        assert_eq!(channel.reconnect_base_delay, Duration::from_millis(250));
        assert_eq!(channel.reconnect_max_delay, ChannelConfig::default().reconnect_max_delay);
        assert_eq!(channel.max_reconnect_attempts, None);
    }

    #[test]
    fn csv_render_writes_html() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("products.csv");
        let html = dir.path().join("table.html");
        std::fs::write(&csv, "name,current_stock,max_stock\nWidget,5,20\n").unwrap();

        render_csv(&csv, Some(&html)).unwrap();

        let page = std::fs::read_to_string(&html).unwrap();
        assert!(page.contains("<td>Widget</td>"));
        assert!(page.contains("<td>20</td>"));
    }

    #[tokio::test]
    async fn unusable_push_endpoint_shows_a_banner() {
        let mut controller = offline_controller(Document::product_page_without_controls());
        let config = Config {
            ws_url: Some("http://127.0.0.1:8080/ws".into()),
            ..Default::default()
        };
        let (shutdown_tx, _) = broadcast::channel(1);

        let live = start_live(&config, &mut controller, &shutdown_tx);

        assert!(live.is_none());
        assert!(banner(&controller).starts_with("Error: transport unavailable"));
    }

    #[tokio::test]
    async fn push_channel_starts_for_websocket_urls() {
        let mut controller = offline_controller(Document::product_page_without_controls());
        let config = Config {
            ws_url: Some("ws://127.0.0.1:9/ws".into()),
            max_reconnect_attempts: Some(0),
            ..Default::default()
        };
        let (shutdown_tx, _) = broadcast::channel(1);

        let live = start_live(&config, &mut controller, &shutdown_tx).unwrap();
        let _ = shutdown_tx.send(());
        live.task.abort();

        assert_eq!(banner(&controller), "");
    }

    #[test]
    fn push_failures_are_logged_once() {
        capture_logs();
        let page = Document::new(Element::new("html").with_child(Element::new("div").with_id(STATUS_ID)));
        let mut controller = offline_controller(page);
        let products = ProductList::from(vec![ProductRecord::new("Widget", 5, 20)]);

        apply_event(&mut controller, ChannelEvent::Products(products));

        assert_eq!(logged("cannot find table (`#table tbody`)"), 1);
        assert!(banner(&controller).starts_with("Error: cannot find table"));
    }

    #[test]
    fn rejected_frames_are_shown() {
        let mut controller = offline_controller(Document::product_page_without_controls());

        apply_event(
            &mut controller,
            ChannelEvent::Rejected(StockError::DecodeFailure("missing `list`".into())),
        );

        assert_eq!(banner(&controller), "Error: decode failure: missing `list`");
    }
}
