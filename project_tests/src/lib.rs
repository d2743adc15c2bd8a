//! # Mock Product Server
//!
//! An in-process `axum` server that stands in for the product backend in
//! integration tests. It serves:
//!
//! - `GET /api/v1/products`: the current product list as a bare JSON array.
//!   Every query string is recorded so tests can assert on paging.
//! - `GET /ws`: the push channel. Frames queued with [`MockServer::push`]
//!   are broadcast to every open socket.
//!
//! The server binds to an ephemeral port on `127.0.0.1` and is aborted when
//! the handle is dropped.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use stock_common::model::PushFrame;
use stock_common::{ProductList, ProductRecord};

#[derive(Clone)]
struct MockState {
    products: Arc<Mutex<Vec<ProductRecord>>>,
    failure: Arc<Mutex<Option<StatusCode>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    push_tx: broadcast::Sender<String>,
    kick_tx: broadcast::Sender<()>,
    connections: Arc<AtomicUsize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a running mock server.
pub struct MockServer {
    addr: SocketAddr,
    state: MockState,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Starts serving `products` on an ephemeral local port.
    pub async fn start(products: Vec<ProductRecord>) -> anyhow::Result<Self> {
        let (push_tx, _) = broadcast::channel(64);
        let (kick_tx, _) = broadcast::channel(4);
        let state = MockState {
            products: Arc::new(Mutex::new(products)),
            failure: Arc::new(Mutex::new(None)),
            queries: Arc::new(Mutex::new(Vec::new())),
            push_tx,
            kick_tx,
            connections: Arc::new(AtomicUsize::new(0)),
        };

        let app = Router::new()
            .route("/api/v1/products", get(products_handler))
            .route("/ws", get(ws_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        log::info!("Mock product server listening on {}", addr);

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("Mock product server failed: {}", e);
            }
        });

        Ok(Self { addr, state, task })
    }

    /// Base URL for `ApiClient`, with a trailing slash.
    pub fn http_base(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn set_products(&self, products: Vec<ProductRecord>) {
        *lock(&self.state.products) = products;
    }

    /// Makes the listing endpoint answer with `status` until cleared with
    /// `None`.
    pub fn fail_with(&self, status: Option<u16>) {
        *lock(&self.state.failure) =
            status.map(|code| StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR));
    }

    /// Query strings of every listing request so far, oldest first.
    pub fn queries(&self) -> Vec<HashMap<String, String>> {
        lock(&self.state.queries).clone()
    }

    /// Broadcasts `{ "list": [...] }` to every open socket. Returns how many
    /// sockets were listening.
    pub fn push(&self, list: &ProductList) -> anyhow::Result<usize> {
        let frame = serde_json::to_string(&PushFrame { list: list.clone() })?;
        Ok(self.push_raw(frame))
    }

    /// Broadcasts an arbitrary text frame.
    pub fn push_raw(&self, frame: impl Into<String>) -> usize {
        self.state.push_tx.send(frame.into()).unwrap_or(0)
    }

    /// Closes every open socket from the server side.
    pub fn kick_clients(&self) {
        let _ = self.state.kick_tx.send(());
    }

    /// Number of sockets accepted since start.
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Polls until at least `count` sockets have been accepted. Returns
    /// `false` on timeout.
    pub async fn wait_for_connections(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.connections() < count {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        true
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn products_handler(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    lock(&state.queries).push(query);
    if let Some(status) = *lock(&state.failure) {
        return (status, "service unavailable").into_response();
    }
    let products = lock(&state.products).clone();
    Json(products).into_response()
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<MockState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: MockState) {
    let mut push_rx = state.push_tx.subscribe();
    let mut kick_rx = state.kick_tx.subscribe();
    let client_id = state.connections.fetch_add(1, Ordering::SeqCst) + 1;
    log::info!("Mock client {} connected", client_id);

    loop {
        tokio::select! {
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            frame = push_rx.recv() => match frame {
                Ok(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => log::warn!("Mock client {} skipped {} frames", client_id, skipped),
                Err(RecvError::Closed) => break,
            },
            _ = kick_rx.recv() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }
    log::info!("Mock client {} disconnected", client_id);
}
