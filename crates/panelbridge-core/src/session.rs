//! Simulator WebSocket session.
//!
//! The session owns the live connection and walks through
//! `Disconnected -> Connecting -> SubscribePending -> Streaming`. On open it
//! subscribes to every mapped data reference; value updates are transformed,
//! filtered by the change detector and forwarded to the panel. Closure or a
//! socket error always returns the session to `Disconnected` and schedules a
//! new connection after a fixed delay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::error::{BridgeError, Result};
use crate::link::{DeviceCommand, DeviceSink};
use crate::mapping::{MappingRegistry, WriteValue};
use crate::pipeline::{self, ChangeDetector};
use crate::protocol::{InboundFrame, Request};
use crate::resolver::{IdentifierKind, IdentifierResolver};

/// Connection state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    SubscribePending,
    Streaming,
}

/// Session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub url: String,
    pub reconnect_delay: Duration,
}

impl SessionConfig {
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
        }
    }
}

/// WebSocket session with the simulator.
pub struct ProtocolSession {
    config: SessionConfig,
    registry: Arc<MappingRegistry>,
    resolver: Arc<IdentifierResolver>,
    sink: Arc<dyn DeviceSink>,
    detector: Mutex<ChangeDetector>,
    /// Last issued request id
    req_counter: AtomicU64,
    /// Sender feeding the socket writer while connected
    outbox: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    /// Request id of the pending subscription
    subscribe_req: Mutex<Option<u64>>,
    state: watch::Sender<SessionState>,
    shutdown: watch::Sender<bool>,
}

impl ProtocolSession {
    pub fn new(
        config: SessionConfig,
        registry: Arc<MappingRegistry>,
        resolver: Arc<IdentifierResolver>,
        sink: Arc<dyn DeviceSink>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            registry,
            resolver,
            sink,
            detector: Mutex::new(ChangeDetector::new()),
            req_counter: AtomicU64::new(0),
            outbox: Mutex::new(None),
            subscribe_req: Mutex::new(None),
            state,
            shutdown,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(?previous, ?state, "Session state changed");
        }
    }

    /// Connect, serve, and reconnect until [`close`](Self::close) is called.
    pub async fn run(self: Arc<Self>) {
        let mut shutdown = self.shutdown.subscribe();

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.set_state(SessionState::Connecting);
            let connected = tokio::select! {
                result = connect_async(self.config.url.as_str()) => result,
                _ = shutdown.changed() => break,
            };
            match connected {
                Ok((ws_stream, _)) => {
                    info!(url = %self.config.url, "Connected to simulator");
                    self.serve(ws_stream, &mut shutdown).await;
                }
                Err(e) => {
                    warn!(url = %self.config.url, "Simulator connection failed: {}", e);
                }
            }
            self.set_state(SessionState::Disconnected);

            if *shutdown.borrow() {
                break;
            }

            warn!(
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "Simulator connection lost, reconnecting"
            );
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.set_state(SessionState::Disconnected);
        info!("Simulator session stopped");
    }

    /// Stop the session: close the socket and cancel any pending reconnect.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }

    async fn serve<S>(
        &self,
        ws_stream: tokio_tungstenite::WebSocketStream<S>,
        shutdown: &mut watch::Receiver<bool>,
    ) where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let (mut write, mut read) = ws_stream.split();
        let mut outgoing = self.attach_outbox();

        self.set_state(SessionState::SubscribePending);
        let subscribed = tokio::select! {
            result = self.subscribe_all() => {
                if let Err(e) = result {
                    warn!("Subscription failed: {}", e);
                }
                true
            }
            _ = shutdown.changed() => false,
        };

        if !subscribed {
            if let Err(e) = write.send(Message::Close(None)).await {
                debug!("Close frame not sent: {}", e);
            }
            self.detach();
            return;
        }

        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => self.handle_text(&text),
                    Some(Ok(Message::Close(frame))) => {
                        info!(?frame, "Simulator closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                },
                Some(msg) = outgoing.recv() => {
                    if let Err(e) = write.send(msg).await {
                        warn!("WebSocket send failed: {}", e);
                        break;
                    }
                }
                _ = shutdown.changed() => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!("Close frame not sent: {}", e);
                    }
                    break;
                }
            }
        }

        self.detach();
    }

    fn attach_outbox(&self) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.outbox.lock() = Some(tx);
        rx
    }

    fn detach(&self) {
        self.outbox.lock().take();
        self.subscribe_req.lock().take();
    }

    fn next_req_id(&self) -> u64 {
        self.req_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn send(&self, request: &Request) -> Result<()> {
        let text = serde_json::to_string(request)?;
        let outbox = self.outbox.lock();
        let tx = outbox.as_ref().ok_or(BridgeError::NotConnected)?;
        tx.send(Message::Text(text))
            .map_err(|_| BridgeError::NotConnected)?;
        debug!(req_id = request.req_id, request_type = ?request.request_type, "Request queued");
        Ok(())
    }

    /// Subscribe to every mapped data reference that resolves.
    ///
    /// Names are resolved one at a time; unresolved names are skipped. When
    /// nothing resolves no subscription is sent and `Ok(None)` is returned.
    pub async fn subscribe_all(&self) -> Result<Option<u64>> {
        let names = self.registry.outbound_names();
        let mut ids = Vec::with_capacity(names.len());
        for name in &names {
            match self.resolver.resolve(IdentifierKind::DataRef, name).await {
                Some(id) => ids.push(id),
                None => warn!(dataref = %name, "Skipping unresolved dataref"),
            }
        }

        if ids.is_empty() {
            warn!("No datarefs resolved, not subscribing");
            return Ok(None);
        }

        let request = Request::subscribe(self.next_req_id(), &ids);
        *self.subscribe_req.lock() = Some(request.req_id);
        self.send(&request)?;
        info!(
            req_id = request.req_id,
            count = ids.len(),
            total = names.len(),
            "Subscribed to datarefs"
        );
        Ok(Some(request.req_id))
    }

    /// Handle one text frame from the simulator. Malformed frames are
    /// logged and dropped.
    pub fn handle_text(&self, text: &str) {
        match serde_json::from_str::<InboundFrame>(text) {
            Ok(frame) => self.handle_frame(frame),
            Err(e) => warn!("Dropping malformed frame: {}", e),
        }
    }

    pub fn handle_frame(&self, frame: InboundFrame) {
        match frame {
            InboundFrame::Result {
                request_id,
                success,
                error_code,
                error_message,
            } => {
                if !success {
                    warn!(
                        req_id = ?request_id,
                        code = error_code.as_deref().unwrap_or(""),
                        "Request failed: {}",
                        error_message.as_deref().unwrap_or("unknown error")
                    );
                    return;
                }
                debug!(req_id = ?request_id, "Request succeeded");

                let subscribe_req = *self.subscribe_req.lock();
                if request_id.is_some() && request_id == subscribe_req {
                    self.set_state(SessionState::Streaming);
                    info!("Streaming dataref updates");
                }
            }
            InboundFrame::DatarefUpdateValues { data } => self.process_updates(&data),
            InboundFrame::Unknown => debug!("Ignoring unhandled frame type"),
        }
    }

    /// Transform and forward a batch of value updates in frame order.
    ///
    /// An id that cannot be mapped back to a data reference stops the rest
    /// of the batch. A transform failure only skips its own entry.
    fn process_updates(&self, data: &Map<String, Value>) {
        for (key, raw) in data {
            let name = key
                .parse::<u64>()
                .ok()
                .and_then(|id| self.resolver.name_of(IdentifierKind::DataRef, id));
            let Some(name) = name else {
                warn!(id = %key, "Update for unknown dataref id, dropping rest of batch");
                return;
            };
            let Some(mapping) = self.registry.outbound(&name) else {
                warn!(dataref = %name, "Update for unmapped dataref, dropping rest of batch");
                return;
            };

            let value =
                match pipeline::transform(mapping.transform, raw, mapping.value_map.as_ref()) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(dataref = %name, "Transform failed: {}", e);
                        continue;
                    }
                };

            let forward = self.detector.lock().should_forward(
                &mapping.target_command,
                &value,
                mapping.threshold,
            );
            if forward {
                debug!(command = %mapping.target_command, %value, "Forwarding to panel");
                self.sink.send_command(DeviceCommand {
                    cmd: mapping.target_command.clone(),
                    value,
                });
            }
        }
    }

    /// Activate one or more commands. Every name must resolve before any
    /// request is sent.
    pub async fn execute_commands(&self, names: &[String], hold: f64) -> Result<u64> {
        let ids = self
            .resolver
            .resolve_all(IdentifierKind::Command, names)
            .await?;

        let request = Request::activate_commands(self.next_req_id(), &ids, hold);
        self.send(&request)?;
        info!(req_id = request.req_id, commands = ?names, hold, "Commands activated");
        Ok(request.req_id)
    }

    /// Write a value to one or more data references. Every name must
    /// resolve before any request is sent. A toggle reads the first target
    /// and writes its inverse to all of them.
    pub async fn write_values(&self, names: &[String], value: &WriteValue) -> Result<u64> {
        let ids = self
            .resolver
            .resolve_all(IdentifierKind::DataRef, names)
            .await?;

        let value = match value {
            WriteValue::Literal(value) => value.clone(),
            WriteValue::Toggle => {
                let first = *ids.first().ok_or_else(|| BridgeError::BatchAborted {
                    kind: IdentifierKind::DataRef,
                    names: Vec::new(),
                })?;
                let current = self.resolver.read_value(first).await?;
                toggled(&current)?
            }
        };

        let request = Request::set_values(self.next_req_id(), &ids, &value);
        self.send(&request)?;
        info!(req_id = request.req_id, datarefs = ?names, %value, "Dataref values set");
        Ok(request.req_id)
    }
}

/// Logical inverse of a boolean or integer value.
pub fn toggled(current: &Value) -> Result<Value> {
    let inverse = match current {
        Value::Bool(b) => Some(Value::Bool(!b)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| 1))
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(|integer| Value::from(if integer == 0 { 1 } else { 0 })),
        _ => None,
    };

    inverse.ok_or_else(|| {
        error!(value = %current, "Cannot toggle non-boolean, non-integer value");
        BridgeError::NotToggleable(current.clone())
    })
}
