//! # Live-Update Channel
//!
//! WebSocket client for the product push stream. Each text frame carries
//! `{ "list": [...] }` and is forwarded as a [`ChannelEvent`].
//!
//! The channel runs as a supervising task: when the connection drops it
//! waits with exponential backoff and reconnects, until shutdown is
//! signalled, the event receiver goes away, or the optional attempt limit
//! is exhausted. Lifecycle transitions are published on a watch channel as
//! `Disconnected -> Connecting -> Connected -> Disconnected`.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use crate::error::StockError;
use crate::model::{ProductList, PushFrame};

/// Configuration for the push channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub ws_url: String,
    pub reconnect_base_delay: Duration,
    pub reconnect_max_delay: Duration,
    /// Consecutive reconnect attempts allowed without a successful open.
    /// `None` retries forever; `Some(0)` never reconnects.
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:8080/ws".to_string(),
            reconnect_base_delay: Duration::from_secs(1),
            reconnect_max_delay: Duration::from_secs(60),
            max_reconnect_attempts: None,
        }
    }
}

/// Connection lifecycle of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

/// What the channel hands to its consumer.
#[derive(Debug)]
pub enum ChannelEvent {
    /// A decoded product list that should replace the table contents.
    Products(ProductList),
    /// A frame that could not be decoded.
    Rejected(StockError),
}

impl ChannelEvent {
    /// Decodes one text frame.
    pub fn from_frame(text: &str) -> Self {
        match PushFrame::decode(text) {
            Ok(frame) => ChannelEvent::Products(frame.list),
            Err(e) => ChannelEvent::Rejected(e),
        }
    }
}

/// Exponential backoff: `base * 2^attempt`, capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max, attempt: 0 }
    }

    /// The delay before the next attempt. Advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let factor = 2u32.saturating_pow(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Attempts made since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// The push-channel supervisor.
pub struct LiveChannel {
    config: ChannelConfig,
    url: Url,
    state_tx: watch::Sender<ChannelState>,
}

impl LiveChannel {
    /// Validates the endpoint. Fails with `TransportUnavailable` when the
    /// URL is not a WebSocket URL.
    pub fn open(config: ChannelConfig) -> Result<Self, StockError> {
        let url = Url::parse(&config.ws_url)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(StockError::TransportUnavailable(format!(
                "`{}` is not a WebSocket URL (expected ws:// or wss://)",
                config.ws_url
            )));
        }
        let (state_tx, _) = watch::channel(ChannelState::Disconnected);
        Ok(Self { config, url, state_tx })
    }

    /// Subscribes to lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.state_tx.subscribe()
    }

    /// Primary execution loop with reconnection logic.
    ///
    /// Returns `Ok(())` on shutdown, when `events` is closed, or when an
    /// open connection closes while reconnects are disabled (`Some(0)`).
    /// Returns `TransportUnavailable` once the reconnect limit is exhausted.
    pub async fn run(
        self,
        events: mpsc::Sender<ChannelEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), StockError> {
        let mut backoff = Backoff::new(self.config.reconnect_base_delay, self.config.reconnect_max_delay);

        loop {
            self.set_state(ChannelState::Connecting);
            log::info!("Connecting to live channel: {}", self.url);

            let connected = tokio::select! {
                _ = shutdown.recv() => {
                    self.set_state(ChannelState::Disconnected);
                    return Ok(());
                }
                res = connect_async(self.url.as_str()) => res,
            };

            let opened = match connected {
                Ok((ws_stream, _)) => {
                    self.set_state(ChannelState::Connected);
                    backoff.reset();
                    log::info!("Live channel open.");
                    let (mut write, mut read) = ws_stream.split();

                    loop {
                        tokio::select! {
                            _ = shutdown.recv() => {
                                log::info!("Live channel shutting down.");
                                let _ = write.close().await;
                                self.set_state(ChannelState::Disconnected);
                                return Ok(());
                            }
                            msg = read.next() => {
                                let event = match msg {
                                    Some(Ok(Message::Text(text))) => ChannelEvent::from_frame(text.as_str()),
                                    Some(Ok(Message::Binary(bin))) => match std::str::from_utf8(&bin) {
                                        Ok(text) => ChannelEvent::from_frame(text),
                                        Err(e) => ChannelEvent::Rejected(StockError::DecodeFailure(format!(
                                            "binary frame is not UTF-8: {e}"
                                        ))),
                                    },
                                    Some(Ok(Message::Close(frame))) => {
                                        log::info!("Live channel closed by server: {:?}", frame);
                                        break;
                                    }
                                    Some(Ok(_)) => continue,
                                    Some(Err(e)) => {
                                        log::error!("Live channel read error: {}", e);
                                        break;
                                    }
                                    None => {
                                        log::warn!("Live channel stream ended.");
                                        break;
                                    }
                                };
                                if events.send(event).await.is_err() {
                                    log::info!("Live channel consumer gone; stopping.");
                                    let _ = write.close().await;
                                    self.set_state(ChannelState::Disconnected);
                                    return Ok(());
                                }
                            }
                        }
                    }
                    true
                }
                Err(e) => {
                    log::error!("Failed to connect to live channel: {}", e);
                    false
                }
            };

            self.set_state(ChannelState::Disconnected);
            log::info!("Live channel is closed.");

            if let Some(max) = self.config.max_reconnect_attempts {
                if max == 0 && opened {
                    log::info!("Reconnects are disabled; live channel stopped.");
                    return Ok(());
                }
                if backoff.attempts() >= max {
                    return Err(StockError::TransportUnavailable(format!(
                        "{} unreachable after {} reconnect attempts",
                        self.url, max
                    )));
                }
            }

            let delay = backoff.next_delay();
            log::info!("Reconnecting in {:?} (attempt {})", delay, backoff.attempts());
            tokio::select! {
                _ = shutdown.recv() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn set_state(&self, state: ChannelState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            log::debug!("Live channel state: {:?} -> {:?}", previous, state);
        }
    }
}
