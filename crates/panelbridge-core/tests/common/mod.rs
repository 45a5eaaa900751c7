//! Shared test doubles: an in-memory simulator API and a local WebSocket
//! endpoint standing in for X-Plane.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use panelbridge_core::prelude::*;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Route bridge logs to the test output (use try_init, several tests share
/// the process).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Simulator API backed by a fixed name table. Counts lookups.
pub struct MockApi {
    ids: HashMap<(IdentifierKind, String), u64>,
    current: Mutex<Value>,
    lookups: AtomicUsize,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            current: Mutex::new(Value::from(0)),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn dataref(mut self, name: &str, id: u64) -> Self {
        self.ids.insert((IdentifierKind::DataRef, name.to_string()), id);
        self
    }

    pub fn command(mut self, name: &str, id: u64) -> Self {
        self.ids.insert((IdentifierKind::Command, name.to_string()), id);
        self
    }

    pub fn set_current(&self, value: Value) {
        *self.current.lock() = value;
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SimulatorApi for MockApi {
    async fn lookup_id(&self, kind: IdentifierKind, name: &str) -> Result<Option<u64>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.ids.get(&(kind, name.to_string())).copied())
    }

    async fn read_value(&self, _id: u64) -> Result<Value> {
        Ok(self.current.lock().clone())
    }
}

/// Local WebSocket listener.
pub struct FakeSimulator {
    listener: TcpListener,
}

impl FakeSimulator {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self { listener }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/api/v2", self.listener.local_addr().unwrap())
    }

    /// Accept the next session connection.
    pub async fn accept(&self) -> WebSocketStream<TcpStream> {
        let (stream, _) = tokio::time::timeout(TIMEOUT, self.listener.accept())
            .await
            .expect("no connection from session")
            .unwrap();
        tokio_tungstenite::accept_async(stream).await.unwrap()
    }
}

impl FakeSimulator {
    /// Assert that the session does not open another connection within `wait`.
    pub async fn expect_no_connection(&self, wait: Duration) {
        if let Ok(accepted) = tokio::time::timeout(wait, self.listener.accept()).await {
            panic!("unexpected connection {:?}", accepted.map(|(_, addr)| addr));
        }
    }
}

/// Simulator API whose calls never complete.
pub struct StalledApi;

#[async_trait]
impl SimulatorApi for StalledApi {
    async fn lookup_id(&self, _kind: IdentifierKind, _name: &str) -> Result<Option<u64>> {
        std::future::pending().await
    }

    async fn read_value(&self, _id: u64) -> Result<Value> {
        std::future::pending().await
    }
}

/// Read the next text frame as JSON.
pub async fn next_request(ws: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        let msg = tokio::time::timeout(TIMEOUT, ws.next())
            .await
            .expect("no frame from session");
        match msg {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            other => panic!("expected a text frame, got {:?}", other),
        }
    }
}

/// Assert that no text frame arrives within `wait`.
pub async fn expect_silence(ws: &mut WebSocketStream<TcpStream>, wait: Duration) {
    if let Ok(Some(Ok(Message::Text(text)))) = tokio::time::timeout(wait, ws.next()).await {
        panic!("unexpected frame {}", text);
    }
}

pub async fn reply(ws: &mut WebSocketStream<TcpStream>, frame: Value) {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
}

/// Wait until the session reports `state`.
pub async fn wait_for_state(session: &ProtocolSession, state: SessionState) {
    let mut rx = session.subscribe_state();
    tokio::time::timeout(TIMEOUT, rx.wait_for(|s| *s == state))
        .await
        .expect("session did not reach state")
        .unwrap();
}
