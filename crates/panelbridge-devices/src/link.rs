//! Reconnecting panel link.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use panelbridge_core::link::{DeviceCommand, DeviceInput, DeviceSink};

use crate::error::{LinkError, LinkResult};
use crate::framing;

/// Panel inputs buffered before the link stops reading.
const INPUT_BUFFER: usize = 64;

/// Opens the byte stream to the panel. Called on the blocking pool.
pub trait PortOpener: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Send + 'static;

    /// Open the port, returning its path and stream.
    fn open(&self) -> LinkResult<(String, Self::Stream)>;
}

#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Wait between a lost or failed connection and the next attempt
    pub reconnect_delay: Duration,
    /// Wait after opening for the board to finish its reset
    pub settle_delay: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
            settle_delay: Duration::from_secs(2),
        }
    }
}

/// Line-framed JSON link to the panel with automatic reconnection.
///
/// Inputs are delivered on the receiver returned by [`DeviceLink::new`].
/// Output frames go through the [`DeviceSink`] impl and are dropped while
/// the link is down.
pub struct DeviceLink<O: PortOpener> {
    opener: O,
    config: LinkConfig,
    inputs: mpsc::Sender<DeviceInput>,
    outbox: Mutex<Option<mpsc::UnboundedSender<DeviceCommand>>>,
    connected: watch::Sender<bool>,
    shutdown: watch::Sender<bool>,
}

impl<O: PortOpener> DeviceLink<O> {
    pub fn new(opener: O, config: LinkConfig) -> (Self, mpsc::Receiver<DeviceInput>) {
        let (inputs, rx) = mpsc::channel(INPUT_BUFFER);
        let (connected, _) = watch::channel(false);
        let (shutdown, _) = watch::channel(false);

        let link = Self {
            opener,
            config,
            inputs,
            outbox: Mutex::new(None),
            connected,
            shutdown,
        };
        (link, rx)
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    /// Close the port and stop reconnecting.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }

    /// Open, serve and reopen the port until [`close`](Self::close) is
    /// called or the input receiver is dropped.
    pub async fn run(self: Arc<Self>) {
        let mut shutdown = self.shutdown.subscribe();

        loop {
            if *shutdown.borrow() {
                break;
            }

            let link = Arc::clone(&self);
            let opening = tokio::task::spawn_blocking(move || link.opener.open());
            let opened = tokio::select! {
                joined = opening => {
                    joined.unwrap_or_else(|e| Err(LinkError::Io(std::io::Error::other(e))))
                }
                _ = shutdown.changed() => break,
            };

            match opened {
                Ok((path, stream)) => {
                    debug!(port = %path, "Serial port opened, waiting for panel reset");
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.settle_delay) => {}
                        _ = shutdown.changed() => break,
                    }

                    let mut outgoing = self.attach_outbox();
                    self.connected.send_replace(true);
                    info!(port = %path, "Connected to panel");

                    let result =
                        framing::pump(stream, &self.inputs, &mut outgoing, &mut shutdown).await;

                    self.outbox.lock().take();
                    self.connected.send_replace(false);
                    if let Err(e) = result {
                        warn!(port = %path, "Panel connection lost: {}", e);
                    }
                }
                Err(e) => warn!("Panel not available: {}", e),
            }

            if *shutdown.borrow() || self.inputs.is_closed() {
                break;
            }

            info!(
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "Retrying panel connection"
            );
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.outbox.lock().take();
        self.connected.send_replace(false);
        info!("Panel link stopped");
    }

    fn attach_outbox(&self) -> mpsc::UnboundedReceiver<DeviceCommand> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.outbox.lock() = Some(tx);
        rx
    }
}

impl<O: PortOpener> DeviceSink for DeviceLink<O> {
    fn send_command(&self, command: DeviceCommand) {
        let sent = match self.outbox.lock().as_ref() {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        };
        if !sent {
            debug!("Panel link down, dropping frame");
        }
    }
}
